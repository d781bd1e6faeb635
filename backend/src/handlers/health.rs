use actix_web::HttpResponse;

/// GET /health and GET /api/v1/health
///
/// Liveness only; never touches the database and needs no API key.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
