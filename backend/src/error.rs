use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

use crate::services::{CallOutcome, FailureKind, RateLimitError, RegistryError, StoreError};

/// Application-level error type
#[derive(Debug)]
pub enum AppError {
    /// Database error
    Database(String),
    /// Validation error
    Validation(String),
    /// Not found error
    NotFound(String),
    /// Missing or wrong API key
    Unauthorized(String),
    /// Rate limit exceeded
    RateLimited { retry_after: u64 },
    /// A proxied call failed after reaching the network
    Upstream {
        kind: FailureKind,
        agent_id: i64,
        latency_ms: f64,
        message: String,
    },
    /// Internal server error
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
    meta: ErrorMeta,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct ErrorMeta {
    request_id: String,
}

impl AppError {
    /// Error returned to the caller for a recorded upstream failure
    pub fn from_failed_call(agent_id: i64, outcome: &CallOutcome) -> Self {
        match (outcome.failure_kind(), outcome.error_message()) {
            (Some(kind), Some(message)) => Self::Upstream {
                kind,
                agent_id,
                latency_ms: outcome.latency_ms(),
                message,
            },
            _ => Self::Internal("call outcome is not a failure".to_string()),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Upstream { kind, .. } => match kind {
                FailureKind::HttpError => "UPSTREAM_HTTP_ERROR",
                FailureKind::InvalidResponse => "UPSTREAM_INVALID_RESPONSE",
                FailureKind::Timeout => "UPSTREAM_TIMEOUT",
                FailureKind::Unreachable => "UPSTREAM_UNREACHABLE",
            },
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::RateLimited { retry_after } => {
                Some(serde_json::json!({ "retry_after": retry_after }))
            }
            Self::Upstream {
                agent_id,
                latency_ms,
                ..
            } => Some(serde_json::json!({
                "agent_id": agent_id,
                "latency_ms": latency_ms,
            })),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(msg) => write!(f, "Database error: {msg}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::NotFound(msg) => write!(f, "{msg}"),
            Self::Unauthorized(msg) => write!(f, "{msg}"),
            Self::RateLimited { .. } => write!(f, "Rate limit exceeded."),
            Self::Upstream { message, .. } => write!(f, "{message}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            error: ErrorBody {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
            meta: ErrorMeta {
                request_id: uuid::Uuid::new_v4().to_string(),
            },
        };

        match self {
            Self::Database(_) | Self::Internal(_) => {
                HttpResponse::InternalServerError().json(error_response)
            }
            Self::Validation(_) => HttpResponse::UnprocessableEntity().json(error_response),
            Self::NotFound(_) => HttpResponse::NotFound().json(error_response),
            Self::Unauthorized(_) => HttpResponse::Unauthorized().json(error_response),
            Self::RateLimited { retry_after } => HttpResponse::TooManyRequests()
                .insert_header(("Retry-After", retry_after.to_string()))
                .json(error_response),
            Self::Upstream { kind, .. } => match kind {
                FailureKind::Timeout => HttpResponse::GatewayTimeout().json(error_response),
                _ => HttpResponse::BadGateway().json(error_response),
            },
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AgentNotFound(id) => Self::NotFound(format!("Agent {id} not found.")),
            StoreError::Database(e) => Self::Database(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Validation(msg) => Self::Validation(msg),
            RegistryError::AgentNotFound(id) => Self::NotFound(format!("Agent {id} not found.")),
            RegistryError::Store(e) => {
                tracing::error!(error = %e, "Agent store failure");
                Self::from(e)
            }
        }
    }
}

impl From<RateLimitError> for AppError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::RateLimited { retry_after } => Self::RateLimited { retry_after },
        }
    }
}
