use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{
    CallAgentRequest, CallAgentResponse, CallHistoryQuery, RegisterAgentRequest,
    ReportResultRequest, SearchQuery,
};
use crate::services::{AuthenticatedCaller, CallOutcome};
use crate::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    data: T,
    meta: ResponseMeta,
}

#[derive(Serialize)]
struct ResponseMeta {
    request_id: String,
}

impl<T: Serialize> ApiResponse<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta {
                request_id: uuid::Uuid::new_v4().to_string(),
            },
        }
    }
}

/// POST /api/v1/agents/register
///
/// Register a new agent. Metrics start at zero.
pub async fn register_agent(
    _caller: AuthenticatedCaller,
    state: web::Data<AppState>,
    body: web::Json<RegisterAgentRequest>,
) -> Result<HttpResponse, AppError> {
    let agent = state.registry.register(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(agent)))
}

/// GET /api/v1/agents/search
///
/// Filter by skill, price ceiling and reputation floor, best candidates first.
pub async fn search_agents(
    _caller: AuthenticatedCaller,
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    let agents = state.registry.search(&query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(agents)))
}

/// POST /api/v1/agents/call
///
/// Proxy a payload to the agent. Upstream failures are recorded against the
/// agent before they are returned as 502/504.
pub async fn call_agent(
    _caller: AuthenticatedCaller,
    state: web::Data<AppState>,
    body: web::Json<CallAgentRequest>,
) -> Result<HttpResponse, AppError> {
    let CallAgentRequest { agent_id, payload } = body.into_inner();
    let result = state.registry.call(agent_id, payload).await?;

    match result.outcome {
        CallOutcome::Success { latency_ms, result } => {
            Ok(HttpResponse::Ok().json(ApiResponse::new(CallAgentResponse {
                agent_id,
                success: true,
                latency_ms,
                result: Some(result),
                error: None,
            })))
        }
        failed => Err(AppError::from_failed_call(agent_id, &failed)),
    }
}

/// POST /api/v1/agents/report
///
/// Record a caller's own success/failure attestation.
pub async fn report_result(
    _caller: AuthenticatedCaller,
    state: web::Data<AppState>,
    body: web::Json<ReportResultRequest>,
) -> Result<HttpResponse, AppError> {
    let agent = state.registry.report(body.agent_id, body.success).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(agent)))
}

/// GET /api/v1/agents/{agentId}
pub async fn get_agent(
    _caller: AuthenticatedCaller,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let agent = state.registry.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(agent)))
}

/// DELETE /api/v1/agents/{agentId}
///
/// Removes the agent together with its call history.
pub async fn delete_agent(
    _caller: AuthenticatedCaller,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    state.registry.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/agents/{agentId}/calls
///
/// Call and report history, newest first.
pub async fn get_call_history(
    _caller: AuthenticatedCaller,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<CallHistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let logs = state
        .registry
        .call_history(path.into_inner(), query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(logs)))
}

/// Configure agent routes
pub fn configure_agent_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/agents")
            .route("/register", web::post().to(register_agent))
            // Static paths must come before /{agentId}
            .route("/search", web::get().to(search_agents))
            .route("/call", web::post().to(call_agent))
            .route("/report", web::post().to(report_result))
            .service(
                web::resource("/{agentId}")
                    .route(web::get().to(get_agent))
                    .route(web::delete().to(delete_agent)),
            )
            .route("/{agentId}/calls", web::get().to(get_call_history)),
    );
}
