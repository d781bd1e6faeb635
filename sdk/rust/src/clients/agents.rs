//! Agents resource client.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};

use crate::error::Error;
use crate::transport::{HttpTransport, Replay};
use crate::types::{Agent, CallLog, CallResult, RegisterAgentRequest, SearchParams};

/// Client for agent-related operations.
#[derive(Debug)]
pub struct AgentsClient {
    transport: Arc<HttpTransport>,
}

impl AgentsClient {
    /// Create a new agents client.
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    /// Register a new agent.
    ///
    /// Registration is not deduplicated; each call creates a new agent.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the server rejects the payload.
    pub async fn register(&self, request: &RegisterAgentRequest) -> Result<Agent, Error> {
        self.transport
            .request(
                Method::POST,
                "/api/v1/agents/register",
                None,
                Some(request),
                Replay::Unsafe,
            )
            .await
    }

    /// Search agents, best candidates first.
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range filters.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Agent>, Error> {
        let query = params.to_query();
        self.transport
            .request(
                Method::GET,
                "/api/v1/agents/search",
                Some(query.as_slice()),
                None::<&()>,
                Replay::Safe,
            )
            .await
    }

    /// Get an agent by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent is not found.
    pub async fn get(&self, agent_id: i64) -> Result<Agent, Error> {
        self.transport
            .request(
                Method::GET,
                &format!("/api/v1/agents/{agent_id}"),
                None,
                None::<&()>,
                Replay::Safe,
            )
            .await
    }

    /// Proxy `payload` to the agent.
    ///
    /// A failed or timed-out agent surfaces as `AgentHubError::Upstream`;
    /// such calls are never retried because the failure is already recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent is unknown or the upstream call failed.
    pub async fn call(&self, agent_id: i64, payload: Value) -> Result<CallResult, Error> {
        let body = json!({ "agent_id": agent_id, "payload": payload });
        self.transport
            .request(
                Method::POST,
                "/api/v1/agents/call",
                None,
                Some(&body),
                Replay::Unsafe,
            )
            .await
    }

    /// Report a success or failure observed outside the proxy.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent is not found.
    pub async fn report(&self, agent_id: i64, success: bool) -> Result<Agent, Error> {
        let body = json!({ "agent_id": agent_id, "success": success });
        self.transport
            .request(
                Method::POST,
                "/api/v1/agents/report",
                None,
                Some(&body),
                Replay::Unsafe,
            )
            .await
    }

    /// Delete an agent and its call history.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent is not found.
    pub async fn delete(&self, agent_id: i64) -> Result<(), Error> {
        self.transport
            .request_empty(Method::DELETE, &format!("/api/v1/agents/{agent_id}"))
            .await
    }

    /// Recent calls and reports for an agent, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent is not found or `limit` is out of range.
    pub async fn calls(&self, agent_id: i64, limit: Option<u32>) -> Result<Vec<CallLog>, Error> {
        let query: Vec<(&str, String)> = limit
            .map(|l| vec![("limit", l.to_string())])
            .unwrap_or_default();
        self.transport
            .request(
                Method::GET,
                &format!("/api/v1/agents/{agent_id}/calls"),
                Some(query.as_slice()),
                None::<&()>,
                Replay::Safe,
            )
            .await
    }

    /// Search for `params` and call the top-ranked agent.
    ///
    /// This is the planner loop: discover by skill, pick the best candidate,
    /// invoke it once.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoCandidate` if the search is empty, otherwise any
    /// error from the search or the call.
    pub async fn call_best(&self, params: &SearchParams, payload: Value) -> Result<CallResult, Error> {
        let candidates = self.search(params).await?;
        let best = candidates
            .first()
            .ok_or_else(|| Error::NoCandidate(params.skill.clone().unwrap_or_default()))?;
        self.call(best.id, payload).await
    }
}
