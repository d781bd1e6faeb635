use std::env;
use std::fmt;

use crate::services::RateLimitConfig;

/// Application configuration loaded from environment variables
#[derive(Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,
    /// Maximum database connections in pool
    pub database_max_connections: u32,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Shared secret callers present in the `X-API-Key` header
    pub api_key: String,
    /// Per-caller admission window
    pub rate_limit: RateLimitConfig,
    /// User-Agent sent on proxied agent calls
    pub upstream_user_agent: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://agenthub.db?mode=rwc".to_string());

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_or(&lookup, "PORT", 8000)?;

        let api_key = lookup("AGENTHUB_API_KEY").unwrap_or_else(|| "dev-secret-key".to_string());
        if api_key.is_empty() {
            return Err(ConfigError::InvalidValue("AGENTHUB_API_KEY"));
        }

        let max_requests: u32 = parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", 120)?;
        if max_requests == 0 {
            return Err(ConfigError::InvalidValue("RATE_LIMIT_MAX_REQUESTS"));
        }

        let window_secs: u64 = parse_or(&lookup, "RATE_LIMIT_WINDOW_SECONDS", 60)?;
        if window_secs == 0 {
            return Err(ConfigError::InvalidValue("RATE_LIMIT_WINDOW_SECONDS"));
        }

        let upstream_user_agent = lookup("UPSTREAM_USER_AGENT")
            .unwrap_or_else(|| format!("agenthub/{}", env!("CARGO_PKG_VERSION")));

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            api_key,
            rate_limit: RateLimitConfig {
                max_requests,
                window_secs,
            },
            upstream_user_agent,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(name)),
        None => Ok(default),
    }
}

// The API key never goes to the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("database_max_connections", &self.database_max_connections)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("rate_limit", &self.rate_limit)
            .field("upstream_user_agent", &self.upstream_user_agent)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
