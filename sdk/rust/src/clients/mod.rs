//! Resource clients for the AgentHub SDK.

pub mod agents;

pub use agents::AgentsClient;
