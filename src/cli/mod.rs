pub mod commands;
pub mod context;
pub mod mcp;
pub mod plan;
pub mod pr;
pub mod project;
pub mod schedule;
pub mod status;
pub mod task;

pub use commands::*;
