//! Agent discovery: filtering and ranking.

use std::cmp::Ordering;

use crate::models::{Agent, SearchQuery};

/// Check query bounds before touching the store.
pub fn validate_search_query(query: &SearchQuery) -> Result<(), String> {
    if let Some(max_price) = query.max_price {
        if !max_price.is_finite() || max_price < 0.0 {
            return Err("max_price must be a non-negative number".to_string());
        }
    }
    if let Some(min_score) = query.min_score {
        if !(0.0..=1.0).contains(&min_score) {
            return Err("min_score must be between 0 and 1".to_string());
        }
    }
    Ok(())
}

fn matches(agent: &Agent, query: &SearchQuery) -> bool {
    // An empty skill string means "no skill filter".
    if let Some(skill) = query.skill.as_deref().filter(|s| !s.is_empty()) {
        if !agent.has_skill(skill) {
            return false;
        }
    }
    if let Some(max_price) = query.max_price {
        if agent.price_per_call > max_price {
            return false;
        }
    }
    if let Some(min_score) = query.min_score {
        if agent.metrics.reputation_score < min_score {
            return false;
        }
    }
    true
}

/// Latency used for ordering; agents never measured sort last.
fn effective_latency(agent: &Agent) -> f64 {
    if agent.metrics.avg_latency > 0.0 {
        agent.metrics.avg_latency
    } else {
        f64::INFINITY
    }
}

/// Ranking order: reputation descending, then price ascending, then
/// measured latency ascending.
pub fn compare_rank(a: &Agent, b: &Agent) -> Ordering {
    b.metrics
        .reputation_score
        .total_cmp(&a.metrics.reputation_score)
        .then_with(|| a.price_per_call.total_cmp(&b.price_per_call))
        .then_with(|| effective_latency(a).total_cmp(&effective_latency(b)))
}

/// Filter `agents` by `query` and sort the survivors by rank.
///
/// The sort is stable, so agents that compare equal keep their input order.
pub fn rank_agents(agents: Vec<Agent>, query: &SearchQuery) -> Vec<Agent> {
    let mut ranked: Vec<Agent> = agents.into_iter().filter(|a| matches(a, query)).collect();
    ranked.sort_by(compare_rank);
    ranked
}
