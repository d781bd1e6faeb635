use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agent entity representing a remote service registered on AgentHub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub name: String,
    pub skills: Vec<String>,
    pub input_schema: serde_json::Value,
    pub output_schema: serde_json::Value,
    pub endpoint: String,
    pub price_per_call: f64,
    pub max_latency_ms: i64,
    #[serde(flatten)]
    pub metrics: AgentMetrics,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }
}

/// Performance history accumulated from calls and reports.
///
/// `total_calls == successful_calls + failed_calls` always holds, and
/// `reputation_score` is the success ratio (0 before the first event).
/// `avg_latency` averages only the events that carried a latency sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub total_calls: i64,
    pub successful_calls: i64,
    pub failed_calls: i64,
    pub avg_latency: f64,
    pub reputation_score: f64,
}

/// Request payload for agent registration
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterAgentRequest {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub input_schema: serde_json::Value,
    pub output_schema: serde_json::Value,
    pub price_per_call: f64,
    pub endpoint: String,
    pub max_latency_ms: i64,
}

/// Request payload for proxying a unit of work to an agent
#[derive(Debug, Clone, Deserialize)]
pub struct CallAgentRequest {
    pub agent_id: i64,
    #[serde(default = "empty_payload")]
    pub payload: serde_json::Value,
}

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Response payload for a successful proxied call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAgentResponse {
    pub agent_id: i64,
    pub success: bool,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request payload for a manual success/failure attestation
#[derive(Debug, Clone, Deserialize)]
pub struct ReportResultRequest {
    pub agent_id: i64,
    pub success: bool,
}

/// Query string for GET /api/v1/agents/search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub skill: Option<String>,
    pub max_price: Option<f64>,
    pub min_score: Option<f64>,
}

/// Query string for GET /api/v1/agents/{agentId}/calls
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallHistoryQuery {
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metrics_serialize_flat() {
        let agent = Agent {
            id: 7,
            name: "SummarizeAgent".to_string(),
            skills: vec!["summarize_text".to_string()],
            input_schema: json!({"text": "string"}),
            output_schema: json!({"summary": "string"}),
            endpoint: "http://127.0.0.1:9001/run".to_string(),
            price_per_call: 0.001,
            max_latency_ms: 500,
            metrics: AgentMetrics::default(),
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&agent).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["total_calls"], 0);
        assert_eq!(value["reputation_score"], 0.0);
        assert!(value.get("metrics").is_none());
        assert!(agent.has_skill("summarize_text"));
        assert!(!agent.has_skill("summarize"));
    }

    #[test]
    fn test_call_request_payload_defaults_to_empty_object() {
        let request: CallAgentRequest = serde_json::from_value(json!({"agent_id": 3})).unwrap();
        assert_eq!(request.agent_id, 3);
        assert_eq!(request.payload, json!({}));
    }

    #[test]
    fn test_register_request_skills_default() {
        let request: RegisterAgentRequest = serde_json::from_value(json!({
            "name": "A",
            "input_schema": {},
            "output_schema": {},
            "price_per_call": 0.0,
            "endpoint": "http://localhost/run",
            "max_latency_ms": 100
        }))
        .unwrap();
        assert!(request.skills.is_empty());
    }
}
