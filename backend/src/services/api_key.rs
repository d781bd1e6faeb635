//! API Key Authentication
//!
//! Every `/api/v1` route requires the shared `X-API-Key` header. The key is
//! kept only as a SHA-256 digest and compared in constant time. Admitted
//! callers are then charged against the rate limiter under that digest.

use std::future::Future;
use std::pin::Pin;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::AppState;

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "X-API-Key";

const UNAUTHORIZED_MESSAGE: &str = "Invalid or missing API key.";

/// Hash a key using SHA256
pub fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Validates presented keys against the configured secret
#[derive(Clone)]
pub struct ApiKeyAuth {
    key_hash: String,
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth").finish_non_exhaustive()
    }
}

impl ApiKeyAuth {
    pub fn new(api_key: &str) -> Self {
        Self {
            key_hash: hash_key(api_key),
        }
    }

    /// Digest of `presented` if it matches the configured key.
    pub fn verify(&self, presented: &str) -> Option<String> {
        let digest = hash_key(presented);
        constant_time_eq(&digest, &self.key_hash).then_some(digest)
    }
}

/// A caller that presented the right key and was admitted by the rate limiter.
///
/// Add it as a handler parameter to protect the route.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller {
    /// Digest of the presented key; also the rate limiting key
    pub key_id: String,
}

impl FromRequest for AuthenticatedCaller {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
                tracing::error!("AppState not configured in app data");
                AppError::Internal("Authentication service not configured".to_string())
            })?;

            let presented = req
                .headers()
                .get(API_KEY_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();

            let key_id = state.auth.verify(presented).ok_or_else(|| {
                tracing::debug!(path = %req.path(), "Rejected request with bad API key");
                AppError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string())
            })?;

            state.rate_limiter.check_and_record(&key_id).await.map_err(|e| {
                tracing::debug!(path = %req.path(), "Request rate limited");
                AppError::from(e)
            })?;

            Ok(Self { key_id })
        })
    }
}
