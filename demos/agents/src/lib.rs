//! Demo agents for AgentHub
//!
//! Three deliberately simple agents a planner can chain through the hub:
//! summarize, translate and keyword extraction. Each serves `POST /run` and
//! answers with a JSON object. Bad input gets 422 with a `detail` message.

use actix_web::{error, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

/// Words kept by the summarizer before it truncates
pub const SUMMARY_WORDS: usize = 12;
/// Keywords returned at most
pub const MAX_KEYWORDS: usize = 8;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "to", "of", "in", "is", "it", "for", "on", "with", "this",
    "that",
];

/// First `SUMMARY_WORDS` words, with an ellipsis when anything was cut.
pub fn summarize(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut summary = words
        .iter()
        .take(SUMMARY_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > SUMMARY_WORDS {
        summary.push_str("...");
    }
    summary
}

/// Tag the text with the target language.
pub fn translate(text: &str, language: &str) -> String {
    format!("[{}] {}", language.to_lowercase(), text)
}

/// Distinct lowercase alphanumeric tokens of three or more characters,
/// stop words removed, in order of first appearance.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut keywords: Vec<String> = Vec::new();

    for token in lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= 3)
    {
        if STOP_WORDS.contains(&token) || keywords.iter().any(|k| k == token) {
            continue;
        }
        keywords.push(token.to_string());
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }

    keywords
}

#[derive(Debug, Deserialize)]
struct TextRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
struct TranslateRequest {
    text: String,
    language: String,
}

fn unprocessable(detail: &str) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(json!({ "detail": detail }))
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let detail = err.to_string();
    error::InternalError::from_response(err, unprocessable(&detail)).into()
}

async fn run_summarize(body: web::Json<TextRequest>) -> HttpResponse {
    if body.text.is_empty() {
        return unprocessable("text must not be empty");
    }
    HttpResponse::Ok().json(json!({ "summary": summarize(&body.text) }))
}

async fn run_translate(body: web::Json<TranslateRequest>) -> HttpResponse {
    if body.text.is_empty() {
        return unprocessable("text must not be empty");
    }
    if !(2..=32).contains(&body.language.chars().count()) {
        return unprocessable("language must be between 2 and 32 characters");
    }
    HttpResponse::Ok().json(json!({ "translation": translate(&body.text, &body.language) }))
}

async fn run_extract_keywords(body: web::Json<TextRequest>) -> HttpResponse {
    if body.text.is_empty() {
        return unprocessable("text must not be empty");
    }
    HttpResponse::Ok().json(json!({ "keywords": extract_keywords(&body.text) }))
}

/// The demo agents and where each listens by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoAgent {
    Summarize,
    Translate,
    KeywordExtract,
}

impl DemoAgent {
    pub const ALL: [DemoAgent; 3] = [Self::Summarize, Self::Translate, Self::KeywordExtract];

    pub fn name(self) -> &'static str {
        match self {
            Self::Summarize => "SummarizeAgent",
            Self::Translate => "TranslateAgent",
            Self::KeywordExtract => "KeywordExtractAgent",
        }
    }

    /// Environment variable overriding the port
    pub fn port_var(self) -> &'static str {
        match self {
            Self::Summarize => "SUMMARIZE_AGENT_PORT",
            Self::Translate => "TRANSLATE_AGENT_PORT",
            Self::KeywordExtract => "KEYWORD_AGENT_PORT",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Summarize => 9001,
            Self::Translate => 9002,
            Self::KeywordExtract => 9003,
        }
    }

    /// Mount this agent's `POST /run` route.
    pub fn configure(self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::JsonConfig::default().error_handler(json_error));
        match self {
            Self::Summarize => cfg.route("/run", web::post().to(run_summarize)),
            Self::Translate => cfg.route("/run", web::post().to(run_translate)),
            Self::KeywordExtract => cfg.route("/run", web::post().to(run_extract_keywords)),
        };
    }
}
