//! AgentHub planner workflow
//!
//! Registers the three demo agents, then chains them through the hub:
//! summarize a text, translate the summary, extract keywords from the
//! translation. Each step discovers the best agent for its skill and feeds
//! the previous result into the next payload.
//!
//! Start the hub (`cargo run -p agenthub`) and the demo agents
//! (`cargo run -p agenthub-demo-agents`), then:
//!
//! ```bash
//! cargo run -p agenthub-sdk --example planner
//! ```

use std::env;

use serde_json::{json, Value};

use agenthub_sdk::{AgentHubClient, Error, RegisterAgentRequest, SearchParams};

const INPUT_TEXT: &str =
    "AgentHub lets AI agents discover each other, collaborate, and complete tasks through one API.";

fn demo_agents(host: &str) -> Vec<RegisterAgentRequest> {
    vec![
        RegisterAgentRequest::new("SummarizeAgent", format!("http://{host}:9001/run"))
            .skill("summarize_text")
            .schemas(json!({"text": "string"}), json!({"summary": "string"}))
            .price_per_call(0.001)
            .max_latency_ms(500),
        RegisterAgentRequest::new("TranslateAgent", format!("http://{host}:9002/run"))
            .skill("translate_text")
            .schemas(
                json!({"text": "string", "language": "string"}),
                json!({"translation": "string"}),
            )
            .price_per_call(0.002)
            .max_latency_ms(500),
        RegisterAgentRequest::new("KeywordExtractAgent", format!("http://{host}:9003/run"))
            .skill("extract_keywords")
            .schemas(json!({"text": "string"}), json!({"keywords": "list[string]"}))
            .price_per_call(0.0015)
            .max_latency_ms(500),
    ]
}

/// Call the best agent for `skill` and return one field of its result.
async fn step(
    client: &AgentHubClient,
    skill: &str,
    payload: Value,
    field: &str,
) -> Result<Value, Error> {
    let params = SearchParams::skill(skill).max_price(0.01).min_score(0.0);
    let call = client.agents().call_best(&params, payload).await?;
    println!("   agent #{} answered in {:.0} ms", call.agent_id, call.latency_ms);

    call.result
        .get(field)
        .cloned()
        .ok_or_else(|| Error::Http(format!("{skill} result has no '{field}' field")))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== AgentHub Planner ===\n");

    let client = AgentHubClient::from_env()?;
    let host = env::var("DEMO_AGENT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

    println!("1. Registering demo agents...");
    for request in demo_agents(&host) {
        let agent = client.agents().register(&request).await?;
        println!("   {} registered as #{}", agent.name, agent.id);
    }

    println!("\n2. Summarizing...");
    let summary = step(&client, "summarize_text", json!({"text": INPUT_TEXT}), "summary").await?;
    println!("   Summary: {summary}");

    println!("\n3. Translating the summary...");
    let translation = step(
        &client,
        "translate_text",
        json!({"text": summary, "language": "spanish"}),
        "translation",
    )
    .await?;
    println!("   Translation: {translation}");

    println!("\n4. Extracting keywords...");
    let keywords = step(&client, "extract_keywords", json!({"text": translation}), "keywords").await?;
    println!("   Keywords: {keywords}");

    println!("\nPlanner workflow complete.");
    Ok(())
}
