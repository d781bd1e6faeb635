pub mod agent;
pub mod call_log;

pub use agent::*;
pub use call_log::*;
