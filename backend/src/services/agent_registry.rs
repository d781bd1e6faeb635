use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{Agent, CallLog, NewCallLog, RegisterAgentRequest, SearchQuery};
use crate::services::agent_store::{AgentStore, StoreError};
use crate::services::call_proxy::{CallOutcome, CallProxy};
use crate::services::metrics::apply_call_metrics;
use crate::services::search::{rank_agents, validate_search_query};

const MAX_NAME_LEN: usize = 255;
const MAX_ENDPOINT_LEN: usize = 500;

/// Default number of call logs returned by `call_history`
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
/// Upper bound on the number of call logs returned by `call_history`
pub const MAX_HISTORY_LIMIT: i64 = 500;

/// Errors that can occur in the agent registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0}")]
    Validation(String),
    #[error("Agent not found: {0}")]
    AgentNotFound(i64),
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AgentNotFound(id) => Self::AgentNotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Validate a registration payload.
pub fn validate_registration(request: &RegisterAgentRequest) -> Result<(), RegistryError> {
    let name_len = request.name.chars().count();
    if name_len == 0 || name_len > MAX_NAME_LEN {
        return Err(RegistryError::Validation(format!(
            "name must be between 1 and {MAX_NAME_LEN} characters"
        )));
    }

    let endpoint_len = request.endpoint.chars().count();
    if endpoint_len == 0 || endpoint_len > MAX_ENDPOINT_LEN {
        return Err(RegistryError::Validation(format!(
            "endpoint must be between 1 and {MAX_ENDPOINT_LEN} characters"
        )));
    }

    if !request.price_per_call.is_finite() || request.price_per_call < 0.0 {
        return Err(RegistryError::Validation(
            "price_per_call must be a non-negative number".to_string(),
        ));
    }

    if request.max_latency_ms <= 0 {
        return Err(RegistryError::Validation(
            "max_latency_ms must be greater than 0".to_string(),
        ));
    }

    if !request.input_schema.is_object() {
        return Err(RegistryError::Validation(
            "input_schema must be a JSON object".to_string(),
        ));
    }
    if !request.output_schema.is_object() {
        return Err(RegistryError::Validation(
            "output_schema must be a JSON object".to_string(),
        ));
    }

    Ok(())
}

fn validate_agent_id(agent_id: i64) -> Result<(), RegistryError> {
    if agent_id <= 0 {
        return Err(RegistryError::Validation(
            "agent_id must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// One async lock per agent id.
///
/// Serializes the read-modify-write of an agent's counters so concurrent
/// events never lose an update. An entry lives only while some task holds or
/// waits on it, so lookups of unknown ids leave nothing behind.
#[derive(Debug, Clone, Default)]
struct AgentLocks {
    locks: Arc<LockMap>,
}

type LockMap = StdMutex<HashMap<i64, Arc<Mutex<()>>>>;

fn lock_map(map: &LockMap) -> MutexGuard<'_, HashMap<i64, Arc<Mutex<()>>>> {
    // The map holds no invariant a panicking holder could break.
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AgentLocks {
    async fn acquire(&self, agent_id: i64) -> AgentLockGuard {
        let lock = Arc::clone(lock_map(&self.locks).entry(agent_id).or_default());
        let guard = lock.lock_owned().await;
        AgentLockGuard {
            agent_id,
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        lock_map(&self.locks).len()
    }
}

/// Held lock on one agent. Dropping it removes the map entry once no other
/// task references it.
struct AgentLockGuard {
    agent_id: i64,
    locks: Arc<LockMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for AgentLockGuard {
    fn drop(&mut self) {
        // Release the agent lock first so its Arc no longer counts.
        drop(self.guard.take());

        let mut locks = lock_map(&self.locks);
        if locks
            .get(&self.agent_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.agent_id);
        }
    }
}

/// A proxied call after its outcome has been recorded
#[derive(Debug, Clone)]
pub struct CallResult {
    /// The agent with metrics reflecting this call
    pub agent: Agent,
    pub outcome: CallOutcome,
}

/// Service for registering, discovering, calling and scoring agents
#[derive(Clone)]
pub struct AgentRegistryService {
    store: Arc<dyn AgentStore>,
    proxy: CallProxy,
    locks: AgentLocks,
}

impl AgentRegistryService {
    pub fn new(store: Arc<dyn AgentStore>, proxy: CallProxy) -> Self {
        Self {
            store,
            proxy,
            locks: AgentLocks::default(),
        }
    }

    /// Register a new agent with zeroed metrics.
    ///
    /// Registration is not deduplicated: identical payloads create distinct agents.
    pub async fn register(&self, request: RegisterAgentRequest) -> Result<Agent, RegistryError> {
        validate_registration(&request)?;

        let agent = self.store.create(&request).await?;
        tracing::info!(agent_id = agent.id, name = %agent.name, "Registered agent");
        Ok(agent)
    }

    /// Get an agent by ID
    pub async fn get(&self, agent_id: i64) -> Result<Agent, RegistryError> {
        self.store
            .get(agent_id)
            .await?
            .ok_or(RegistryError::AgentNotFound(agent_id))
    }

    /// Filter and rank every registered agent.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Agent>, RegistryError> {
        validate_search_query(query).map_err(RegistryError::Validation)?;

        let agents = self.store.list().await?;
        Ok(rank_agents(agents, query))
    }

    /// Proxy `payload` to the agent and record the outcome.
    ///
    /// Upstream failures are returned inside `CallResult`, not as errors; by
    /// the time this returns the metrics update and call log are committed.
    pub async fn call(&self, agent_id: i64, payload: Value) -> Result<CallResult, RegistryError> {
        validate_agent_id(agent_id)?;
        if !payload.is_object() {
            return Err(RegistryError::Validation(
                "payload must be a JSON object".to_string(),
            ));
        }
        let agent = self.get(agent_id).await?;

        let outcome = self.proxy.invoke(&agent, &payload).await;
        tracing::info!(
            agent_id,
            outcome = outcome.kind(),
            latency_ms = outcome.latency_ms(),
            "Agent call finished"
        );

        let entry = NewCallLog {
            success: outcome.is_success(),
            latency_ms: Some(outcome.latency_ms()),
            error_message: outcome.error_message(),
        };
        let agent = self.record(agent_id, entry).await?;

        Ok(CallResult { agent, outcome })
    }

    /// Record a caller's success/failure attestation without a latency sample.
    pub async fn report(&self, agent_id: i64, success: bool) -> Result<Agent, RegistryError> {
        validate_agent_id(agent_id)?;
        let agent = self.record(agent_id, NewCallLog::report(success)).await?;
        tracing::debug!(agent_id, success, "Recorded manual report");
        Ok(agent)
    }

    /// Delete an agent and its call history.
    pub async fn delete(&self, agent_id: i64) -> Result<(), RegistryError> {
        let guard = self.locks.acquire(agent_id).await;
        let deleted = self.store.delete(agent_id).await?;
        drop(guard);

        if !deleted {
            return Err(RegistryError::AgentNotFound(agent_id));
        }

        tracing::info!(agent_id, "Deleted agent");
        Ok(())
    }

    /// Most recent call logs for an agent, newest first.
    pub async fn call_history(
        &self,
        agent_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<CallLog>, RegistryError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(RegistryError::Validation(format!(
                "limit must be between 1 and {MAX_HISTORY_LIMIT}"
            )));
        }

        // Distinguish "no such agent" from "no calls yet".
        self.get(agent_id).await?;
        Ok(self.store.call_logs(agent_id, limit).await?)
    }

    /// Apply one event to the agent's metrics and persist it with its log entry.
    async fn record(&self, agent_id: i64, entry: NewCallLog) -> Result<Agent, RegistryError> {
        let _guard = self.locks.acquire(agent_id).await;

        let mut agent = self.get(agent_id).await?;
        let prior_samples = match entry.latency_ms {
            Some(_) => Some(self.store.count_latency_samples(agent_id).await?),
            None => None,
        };

        apply_call_metrics(&mut agent.metrics, entry.success, entry.latency_ms, prior_samples);
        self.store.record_event(&agent, &entry).await?;

        Ok(agent)
    }
}
