//! Call Proxy
//!
//! Issues exactly one bounded outbound request to an agent endpoint and
//! classifies what came back. Upstream failures are ordinary outcomes here,
//! never errors: the caller records every one of them before answering.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::Value;

use crate::models::Agent;

/// Lower bound on the per-call timeout, in seconds
pub const MIN_CALL_TIMEOUT_SECS: f64 = 0.05;
/// Upper bound on the per-call timeout, in seconds
pub const MAX_CALL_TIMEOUT_SECS: f64 = 30.0;

/// Result of one proxied call. Every variant carries the measured round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// Status below 400 with a JSON object body
    Success { latency_ms: f64, result: Value },
    /// Status 400 or above
    UpstreamError { latency_ms: f64, status: u16 },
    /// Body was not a JSON object
    InvalidResponse { latency_ms: f64 },
    /// The per-agent timeout elapsed
    Timeout { latency_ms: f64 },
    /// Any other transport failure (refused, DNS, reset, bad URL)
    Unreachable { latency_ms: f64 },
}

/// Failure classes surfaced to callers as 502/504
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    HttpError,
    InvalidResponse,
    Timeout,
    Unreachable,
}

impl CallOutcome {
    pub fn latency_ms(&self) -> f64 {
        match self {
            Self::Success { latency_ms, .. }
            | Self::UpstreamError { latency_ms, .. }
            | Self::InvalidResponse { latency_ms }
            | Self::Timeout { latency_ms }
            | Self::Unreachable { latency_ms } => *latency_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::UpstreamError { .. } => Some(FailureKind::HttpError),
            Self::InvalidResponse { .. } => Some(FailureKind::InvalidResponse),
            Self::Timeout { .. } => Some(FailureKind::Timeout),
            Self::Unreachable { .. } => Some(FailureKind::Unreachable),
        }
    }

    /// Message recorded in the call log and returned to the caller
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::UpstreamError { status, .. } => Some(format!("Agent returned HTTP {status}.")),
            Self::InvalidResponse { .. } => Some("Agent returned a non-JSON response.".to_string()),
            Self::Timeout { .. } => Some("Agent call timed out.".to_string()),
            Self::Unreachable { .. } => Some("Failed to reach agent endpoint.".to_string()),
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::UpstreamError { .. } => "upstream_error",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Timeout { .. } => "timeout",
            Self::Unreachable { .. } => "unreachable",
        }
    }
}

/// Per-call timeout derived from the agent's latency budget
pub fn call_timeout(max_latency_ms: i64) -> Duration {
    let secs = (max_latency_ms as f64 / 1000.0).clamp(MIN_CALL_TIMEOUT_SECS, MAX_CALL_TIMEOUT_SECS);
    Duration::from_secs_f64(secs)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn classify_transport_error(err: &reqwest::Error, latency_ms: f64) -> CallOutcome {
    if err.is_timeout() {
        CallOutcome::Timeout { latency_ms }
    } else {
        CallOutcome::Unreachable { latency_ms }
    }
}

/// Outbound HTTP client for agent calls.
///
/// The underlying connection pool is shared by clones.
#[derive(Debug, Clone)]
pub struct CallProxy {
    client: Client,
}

impl CallProxy {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    /// POST `payload` to the agent's endpoint and classify the result.
    ///
    /// A timed-out request is dropped locally; the remote side is not told.
    pub async fn invoke(&self, agent: &Agent, payload: &Value) -> CallOutcome {
        let timeout = call_timeout(agent.max_latency_ms);
        let started = Instant::now();

        let response = match self
            .client
            .post(&agent.endpoint)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(agent_id = agent.id, error = %e, "Agent request failed");
                return classify_transport_error(&e, elapsed_ms(started));
            }
        };

        // Every outcome is timed after the full body, error statuses included.
        let status = response.status();
        let body = response.bytes().await;
        let latency_ms = elapsed_ms(started);

        let body = match body {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(agent_id = agent.id, error = %e, "Agent response body failed");
                return classify_transport_error(&e, latency_ms);
            }
        };

        if status.as_u16() >= 400 {
            return CallOutcome::UpstreamError {
                latency_ms,
                status: status.as_u16(),
            };
        }

        // Results are documents; a bare scalar or array is not a usable answer.
        match serde_json::from_slice::<Value>(&body) {
            Ok(result) if result.is_object() => CallOutcome::Success { latency_ms, result },
            _ => CallOutcome::InvalidResponse { latency_ms },
        }
    }
}
