pub mod engine;

pub use engine::{Edge, Graph};
