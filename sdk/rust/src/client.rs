//! AgentHub SDK main client.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::AgentsClient;
use crate::error::Error;
use crate::transport::{HttpTransport, RetryConfig};

/// Default base URL for a local AgentHub server.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main client for interacting with the AgentHub API.
///
/// # Example
///
/// ```rust,ignore
/// use agenthub_sdk::{AgentHubClient, SearchParams};
///
/// let client = AgentHubClient::from_env()?;
///
/// let result = client
///     .agents()
///     .call_best(&SearchParams::skill("summarize_text").max_price(0.01), json!({"text": text}))
///     .await?;
/// println!("{}", result.result["summary"]);
/// ```
#[derive(Debug)]
pub struct AgentHubClient {
    transport: Arc<HttpTransport>,
    agents: AgentsClient,
}

impl AgentHubClient {
    /// Create a new AgentHub client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL for API requests (default: <http://127.0.0.1:8000>)
    /// * `api_key` - Shared secret sent as `X-API-Key`
    /// * `timeout` - Request timeout (default: 30 seconds)
    /// * `retry_config` - Configuration for retry behavior (optional)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be created.
    pub fn new(
        base_url: Option<&str>,
        api_key: &str,
        timeout: Option<Duration>,
        retry_config: Option<RetryConfig>,
    ) -> Result<Self, Error> {
        if api_key.is_empty() {
            return Err(Error::Configuration("API key must not be empty".to_string()));
        }

        let base_url = base_url.unwrap_or(DEFAULT_BASE_URL);
        let timeout = timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let transport = Arc::new(HttpTransport::new(base_url, api_key, timeout, retry_config)?);

        Ok(Self {
            agents: AgentsClient::new(Arc::clone(&transport)),
            transport,
        })
    }

    /// Create a client from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `AGENTHUB_API_KEY` - The shared API key (required)
    /// * `AGENTHUB_URL` - Base URL for API (optional, default: <http://127.0.0.1:8000>)
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_env_with_config(None, None)
    }

    /// Create a client from environment variables with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing.
    pub fn from_env_with_config(
        timeout: Option<Duration>,
        retry_config: Option<RetryConfig>,
    ) -> Result<Self, Error> {
        let api_key = env::var("AGENTHUB_API_KEY").map_err(|_| {
            Error::Configuration("AGENTHUB_API_KEY environment variable not set".to_string())
        })?;
        let base_url = env::var("AGENTHUB_URL").ok();

        Self::new(base_url.as_deref(), &api_key, timeout, retry_config)
    }

    /// Get the underlying HTTP transport (for advanced use cases).
    #[must_use]
    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }

    /// Get the agents client.
    #[must_use]
    pub fn agents(&self) -> &AgentsClient {
        &self.agents
    }
}
