//! Data model types for the AgentHub SDK.

pub mod agents;

pub use agents::{Agent, CallLog, CallResult, RegisterAgentRequest, SearchParams};
