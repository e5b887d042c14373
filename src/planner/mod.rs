pub mod contract;
pub mod http;
pub mod mock;

pub use contract::*;
pub use http::AnthropicPlanner;
pub use mock::ScriptedPlanner;
