//! Metrics Engine
//!
//! Pure update of an agent's counters, running latency mean and reputation
//! after a single call or report event.

use crate::models::AgentMetrics;

/// Recompute `reputation_score` from the success counters.
pub fn update_reputation(metrics: &mut AgentMetrics) {
    if metrics.total_calls <= 0 {
        metrics.reputation_score = 0.0;
        return;
    }
    metrics.reputation_score = metrics.successful_calls as f64 / metrics.total_calls as f64;
}

/// Apply one event to `metrics`.
///
/// `prior_latency_samples` is the number of earlier events that carried a
/// latency sample. When it is `None` the pre-update `total_calls` is used
/// instead, which is only exact if every earlier event measured latency.
/// Events without `latency_ms` leave `avg_latency` untouched.
pub fn apply_call_metrics(
    metrics: &mut AgentMetrics,
    success: bool,
    latency_ms: Option<f64>,
    prior_latency_samples: Option<i64>,
) {
    let previous_total = metrics.total_calls;
    metrics.total_calls += 1;
    if success {
        metrics.successful_calls += 1;
    } else {
        metrics.failed_calls += 1;
    }

    if let Some(latency) = latency_ms {
        let samples = prior_latency_samples.unwrap_or(previous_total);
        if samples <= 0 {
            metrics.avg_latency = latency;
        } else {
            let n = samples as f64;
            metrics.avg_latency = (metrics.avg_latency * n + latency) / (n + 1.0);
        }
    }

    update_reputation(metrics);
}
