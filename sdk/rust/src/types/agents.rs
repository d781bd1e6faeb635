//! Agent-related data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A registered agent with its accumulated performance history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent identifier, never reused
    pub id: i64,
    /// Display name for the agent
    pub name: String,
    /// Skill tags matched exactly by search
    pub skills: Vec<String>,
    pub input_schema: Value,
    pub output_schema: Value,
    /// URL the hub POSTs payloads to
    pub endpoint: String,
    pub price_per_call: f64,
    /// Latency budget; also bounds each proxied call
    pub max_latency_ms: i64,
    pub total_calls: i64,
    pub successful_calls: i64,
    pub failed_calls: i64,
    /// Mean latency in ms over measured calls only
    pub avg_latency: f64,
    /// Success ratio in [0, 1]
    pub reputation_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Registration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub input_schema: Value,
    pub output_schema: Value,
    pub price_per_call: f64,
    pub endpoint: String,
    pub max_latency_ms: i64,
}

impl RegisterAgentRequest {
    /// A request with no skills, empty schemas, free calls and a 1s budget.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skills: Vec::new(),
            input_schema: Value::Object(serde_json::Map::new()),
            output_schema: Value::Object(serde_json::Map::new()),
            price_per_call: 0.0,
            endpoint: endpoint.into(),
            max_latency_ms: 1_000,
        }
    }

    #[must_use]
    pub fn skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }

    #[must_use]
    pub fn schemas(mut self, input: Value, output: Value) -> Self {
        self.input_schema = input;
        self.output_schema = output;
        self
    }

    #[must_use]
    pub fn price_per_call(mut self, price: f64) -> Self {
        self.price_per_call = price;
        self
    }

    #[must_use]
    pub fn max_latency_ms(mut self, max_latency_ms: i64) -> Self {
        self.max_latency_ms = max_latency_ms;
        self
    }
}

/// Search filters; unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub skill: Option<String>,
    pub max_price: Option<f64>,
    pub min_score: Option<f64>,
}

impl SearchParams {
    /// Filter by an exact skill tag.
    pub fn skill(skill: impl Into<String>) -> Self {
        Self {
            skill: Some(skill.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn max_price(mut self, max_price: f64) -> Self {
        self.max_price = Some(max_price);
        self
    }

    #[must_use]
    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// Query-string pairs for the set fields.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(skill) = &self.skill {
            query.push(("skill", skill.clone()));
        }
        if let Some(max_price) = self.max_price {
            query.push(("max_price", max_price.to_string()));
        }
        if let Some(min_score) = self.min_score {
            query.push(("min_score", min_score.to_string()));
        }
        query
    }
}

/// Result of a successful proxied call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResult {
    pub agent_id: i64,
    pub success: bool,
    /// Measured round trip to the agent
    pub latency_ms: f64,
    /// The agent's JSON response
    #[serde(default)]
    pub result: Value,
}

/// One recorded call or report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLog {
    pub id: i64,
    pub agent_id: i64,
    pub timestamp: DateTime<Utc>,
    /// Absent for manual reports
    pub latency_ms: Option<f64>,
    pub success: bool,
    pub error_message: Option<String>,
}
