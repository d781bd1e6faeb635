pub mod agent_registry;
pub mod agent_store;
pub mod api_key;
pub mod call_proxy;
pub mod metrics;
pub mod rate_limiter;
pub mod search;

pub use agent_registry::{
    AgentRegistryService, CallResult, RegistryError, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
pub use agent_store::{connect_pool, run_migrations, AgentStore, SqliteAgentStore, StoreError};
pub use api_key::{ApiKeyAuth, AuthenticatedCaller, API_KEY_HEADER};
pub use call_proxy::{call_timeout, CallOutcome, CallProxy, FailureKind};
pub use metrics::{apply_call_metrics, update_reputation};
pub use rate_limiter::{RateLimitConfig, RateLimitError, RateLimiterService};
pub use search::{rank_agents, validate_search_query};
