//! AgentHub SDK for Rust
//!
//! Client for the AgentHub registry: register agents, discover them by skill,
//! and call them through the hub so every call feeds their reputation.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use agenthub_sdk::{AgentHubClient, RegisterAgentRequest, SearchParams};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), agenthub_sdk::Error> {
//! let client = AgentHubClient::new(None, "dev-secret-key", None, None)?;
//!
//! let agent = client
//!     .agents()
//!     .register(
//!         &RegisterAgentRequest::new("Summarizer", "http://127.0.0.1:9001/summarize")
//!             .skill("summarize_text")
//!             .price_per_call(0.002),
//!     )
//!     .await?;
//!
//! let candidates = client.agents().search(&SearchParams::skill("summarize_text")).await?;
//! println!("{} candidates, registered #{}", candidates.len(), agent.id);
//!
//! let result = client
//!     .agents()
//!     .call_best(&SearchParams::skill("summarize_text"), json!({"text": "..."}))
//!     .await?;
//! println!("{} in {:.0} ms", result.result, result.latency_ms);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clients;
pub mod error;
pub mod transport;
pub mod types;

// Re-export main types at crate root
pub use client::AgentHubClient;
pub use clients::AgentsClient;
pub use error::{AgentHubError, Error};
pub use transport::{HttpTransport, Replay, RetryConfig};
pub use types::{Agent, CallLog, CallResult, RegisterAgentRequest, SearchParams};
