//! HTTP Transport for the AgentHub SDK.
//!
//! Handles API-key authentication, envelope unwrapping, automatic retry and
//! error parsing.

use std::time::Duration;

use rand::thread_rng;
use rand::Rng;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AgentHubError, Error};

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Configuration for automatic retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base backoff factor for exponential backoff
    pub backoff_factor: f64,
    /// Status codes that trigger retry
    pub retry_on: Vec<u16>,
    /// Whether to respect Retry-After header
    pub respect_retry_after: bool,
    /// Maximum backoff time in seconds
    pub max_backoff: f64,
    /// Jitter factor (0.1 = ±10%)
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 2.0,
            retry_on: vec![429, 503],
            respect_retry_after: true,
            max_backoff: 60.0,
            jitter: 0.1,
        }
    }
}

impl RetryConfig {
    /// Never retry.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Whether a request may be sent again after an ambiguous failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// Repeating the request has no further effect.
    Safe,
    /// Repeating the request may invoke an agent again (proxied calls).
    /// Gateway errors (502/504) are never retried for these.
    Unsafe,
}

/// HTTP transport layer with authentication and retry logic.
pub struct HttpTransport {
    base_url: String,
    api_key: String,
    client: Client,
    retry_config: RetryConfig,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("retry_config", &self.retry_config)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        retry_config: Option<RetryConfig>,
    ) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            retry_config: retry_config.unwrap_or_default(),
        })
    }

    /// Send a request and return the `data` member of the response envelope.
    ///
    /// # Errors
    ///
    /// Returns an `AgentHubError` on API errors.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Option<&[(&str, String)]>,
        body: Option<&impl Serialize>,
        replay: Replay,
    ) -> Result<T, Error> {
        let response = self
            .execute_with_retry(replay, || self.build(method.clone(), path, params, body))
            .await?;

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("Failed to parse response: {e}")))?;
        let data = envelope
            .get("data")
            .cloned()
            .ok_or_else(|| Error::Http("Missing data in response".to_string()))?;

        serde_json::from_value(data).map_err(Error::from)
    }

    /// Send a request whose success response has no body (204).
    ///
    /// # Errors
    ///
    /// Returns an `AgentHubError` on API errors.
    pub async fn request_empty(&self, method: Method, path: &str) -> Result<(), Error> {
        self.execute_with_retry(Replay::Safe, || {
            self.build(method.clone(), path, None, None::<&()>)
        })
        .await?;
        Ok(())
    }

    fn build(
        &self,
        method: Method,
        path: &str,
        params: Option<&[(&str, String)]>,
        body: Option<&impl Serialize>,
    ) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method, &url)
            .header(API_KEY_HEADER, &self.api_key);

        if let Some(p) = params {
            request = request.query(p);
        }

        if let Some(b) = body {
            request = request.json(b);
        }

        request
    }

    /// Execute a request with automatic retry on retryable errors.
    async fn execute_with_retry<F>(&self, replay: Replay, build: F) -> Result<Response, Error>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;

        loop {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    let error = parse_error_response(response).await;

                    if !self.should_retry(status.as_u16(), attempt, replay) {
                        return Err(error);
                    }

                    let retry_after = match &error {
                        Error::AgentHub(AgentHubError::RateLimited { retry_after, .. }) => {
                            Some(*retry_after)
                        }
                        _ => None,
                    };

                    let wait_time = self.get_backoff_time(attempt, retry_after);
                    tokio::time::sleep(Duration::from_secs_f64(wait_time)).await;
                }
                Err(e) => {
                    // Only a failed connect proves the server never saw the request.
                    if !e.is_connect() || attempt >= self.retry_config.max_retries {
                        return Err(Error::Http(e.to_string()));
                    }

                    let wait_time = self.get_backoff_time(attempt, None);
                    tokio::time::sleep(Duration::from_secs_f64(wait_time)).await;
                }
            }

            attempt += 1;
        }
    }

    /// Determine if a request should be retried.
    fn should_retry(&self, status_code: u16, attempt: u32, replay: Replay) -> bool {
        if attempt >= self.retry_config.max_retries {
            return false;
        }

        if replay == Replay::Unsafe && matches!(status_code, 502 | 504) {
            return false;
        }

        self.retry_config.retry_on.contains(&status_code)
    }

    /// Calculate backoff time for retry.
    ///
    /// Uses exponential backoff with jitter, respecting Retry-After header
    /// if present.
    fn get_backoff_time(&self, attempt: u32, retry_after: Option<u32>) -> f64 {
        if let Some(ra) = retry_after {
            if self.retry_config.respect_retry_after {
                return f64::from(ra).min(self.retry_config.max_backoff);
            }
        }

        // Exponential backoff: backoff_factor ^ attempt
        let base_wait = self.retry_config.backoff_factor.powi(attempt as i32);

        let jitter_range = base_wait * self.retry_config.jitter;
        let wait_time = if jitter_range > 0.0 {
            let jitter = thread_rng().gen_range(-jitter_range..jitter_range);
            base_wait + jitter
        } else {
            base_wait
        };

        wait_time.clamp(0.0, self.retry_config.max_backoff)
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the retry configuration.
    #[must_use]
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }
}

/// Parse an error response into a typed error.
async fn parse_error_response(response: Response) -> Error {
    let status = response.status();
    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u32>().ok());

    let data: Value = response.json().await.unwrap_or_else(|_| serde_json::json!({}));
    error_from_body(status, retry_after, &data)
}

fn error_from_body(status: StatusCode, retry_after: Option<u32>, data: &Value) -> Error {
    let empty_obj = serde_json::json!({});
    let error = data.get("error").unwrap_or(&empty_obj);
    let code = error
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN_ERROR")
        .to_string();
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| format!("HTTP {}", status.as_u16()), String::from);
    let request_id = data
        .get("meta")
        .and_then(|m| m.get("request_id"))
        .and_then(Value::as_str)
        .map(String::from);
    let details = error.get("details");

    let agenthub_error = match status {
        StatusCode::UNAUTHORIZED => AgentHubError::Authentication {
            code,
            message,
            request_id,
        },
        StatusCode::NOT_FOUND => AgentHubError::NotFound {
            code,
            message,
            request_id,
        },
        StatusCode::TOO_MANY_REQUESTS => AgentHubError::RateLimited {
            code,
            message,
            retry_after: retry_after.unwrap_or(60),
            request_id,
        },
        StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => AgentHubError::Upstream {
            code,
            message,
            status: status.as_u16(),
            agent_id: details.and_then(|d| d.get("agent_id")).and_then(Value::as_i64),
            latency_ms: details.and_then(|d| d.get("latency_ms")).and_then(Value::as_f64),
            request_id,
        },
        s if s.is_server_error() => AgentHubError::Server {
            code,
            message,
            request_id,
        },
        _ => AgentHubError::Validation {
            code,
            message,
            request_id,
        },
    };

    Error::AgentHub(agenthub_error)
}
