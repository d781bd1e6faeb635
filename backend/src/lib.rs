//! AgentHub - a registry and call proxy for remote AI agents
//!
//! This library provides the core services, models and HTTP handlers for the
//! AgentHub server. The binary in `main.rs` only wires them together.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::AppError;

pub use models::{Agent, AgentMetrics, CallLog, RegisterAgentRequest, SearchQuery};

pub use services::{
    AgentRegistryService, AgentStore, ApiKeyAuth, CallOutcome, CallProxy, RateLimitConfig,
    RateLimiterService, SqliteAgentStore,
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub auth: ApiKeyAuth,
    pub rate_limiter: RateLimiterService,
    pub registry: AgentRegistryService,
}

impl AppState {
    /// Build state from configuration and an already wired registry.
    pub fn new(config: Config, registry: AgentRegistryService) -> Self {
        Self {
            auth: ApiKeyAuth::new(&config.api_key),
            rate_limiter: RateLimiterService::new(config.rate_limit.clone()),
            registry,
            config,
        }
    }

    /// Replace the rate limiter, e.g. to share one across test apps.
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiterService) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }
}

/// Errors that abort server startup
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Storage initialization failed: {0}")]
    Store(#[from] services::StoreError),
    #[error("HTTP client initialization failed: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Open the database, apply migrations and assemble the application state.
pub async fn build_state(config: Config) -> Result<AppState, StartupError> {
    let pool = services::connect_pool(&config.database_url, config.database_max_connections).await?;
    services::run_migrations(&pool).await?;

    let store = Arc::new(SqliteAgentStore::new(pool));
    let proxy = CallProxy::new(&config.upstream_user_agent)?;

    Ok(AppState::new(config, AgentRegistryService::new(store, proxy)))
}
