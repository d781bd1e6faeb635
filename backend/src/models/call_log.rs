use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable record of one call or report against an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLog {
    pub id: i64,
    pub agent_id: i64,
    pub timestamp: DateTime<Utc>,
    pub latency_ms: Option<f64>,
    pub success: bool,
    pub error_message: Option<String>,
}

/// A call log entry that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewCallLog {
    pub success: bool,
    pub latency_ms: Option<f64>,
    pub error_message: Option<String>,
}

impl NewCallLog {
    /// Entry for a manual report; reports never carry a latency sample.
    pub fn report(success: bool) -> Self {
        Self {
            success,
            latency_ms: None,
            error_message: None,
        }
    }
}
