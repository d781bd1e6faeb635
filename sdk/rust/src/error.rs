//! Error types for the AgentHub SDK.

use thiserror::Error;

/// Main error type for the AgentHub SDK.
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Search returned nothing to call
    #[error("No agent offers skill '{0}' within the given constraints")]
    NoCandidate(String),

    /// AgentHub API error
    #[error(transparent)]
    AgentHub(#[from] AgentHubError),
}

/// Typed errors for AgentHub API responses.
///
/// Each variant corresponds to a class of HTTP status returned by the server.
#[derive(Error, Debug, Clone)]
pub enum AgentHubError {
    /// Missing or wrong API key (401).
    #[error("[{code}] {message}")]
    Authentication {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Unknown agent (404).
    #[error("[{code}] {message}")]
    NotFound {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Too many requests for this API key (429).
    #[error("[{code}] {message} (retry after {retry_after}s)")]
    RateLimited {
        code: String,
        message: String,
        retry_after: u32,
        request_id: Option<String>,
    },

    /// Request rejected by validation (400, 422).
    #[error("[{code}] {message}")]
    Validation {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// The proxied agent failed (502) or timed out (504).
    ///
    /// The failure has already been recorded against the agent.
    #[error("[{code}] {message}")]
    Upstream {
        code: String,
        message: String,
        status: u16,
        agent_id: Option<i64>,
        latency_ms: Option<f64>,
        request_id: Option<String>,
    },

    /// Any other server error (5xx).
    #[error("[{code}] {message}")]
    Server {
        code: String,
        message: String,
        request_id: Option<String>,
    },
}

impl AgentHubError {
    /// Get the error code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Authentication { code, .. }
            | Self::NotFound { code, .. }
            | Self::RateLimited { code, .. }
            | Self::Validation { code, .. }
            | Self::Upstream { code, .. }
            | Self::Server { code, .. } => code,
        }
    }

    /// Get the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Authentication { message, .. }
            | Self::NotFound { message, .. }
            | Self::RateLimited { message, .. }
            | Self::Validation { message, .. }
            | Self::Upstream { message, .. }
            | Self::Server { message, .. } => message,
        }
    }

    /// Get the request ID if available.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Authentication { request_id, .. }
            | Self::NotFound { request_id, .. }
            | Self::RateLimited { request_id, .. }
            | Self::Validation { request_id, .. }
            | Self::Upstream { request_id, .. }
            | Self::Server { request_id, .. } => request_id.as_deref(),
        }
    }

    /// Get the retry-after value for rate limited errors.
    #[must_use]
    pub fn retry_after(&self) -> Option<u32> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Whether repeating the same request may succeed without side effects.
    ///
    /// Upstream failures are excluded: repeating a call invokes the agent again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Server { .. })
    }
}
