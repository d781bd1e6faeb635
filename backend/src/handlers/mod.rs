use actix_web::{error, web, HttpRequest};

use crate::error::AppError;

pub mod agents;
pub mod health;

#[cfg(test)]
mod agents_http_tests;

pub use agents::configure_agent_routes;
pub use health::health_check;

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

/// Mount every route: the unauthenticated health checks and the `/api/v1` API.
///
/// Malformed bodies, query strings and path parameters surface as
/// `VALIDATION_ERROR` (422) in the standard error envelope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .app_data(web::PathConfig::default().error_handler(path_error))
            .route("/health", web::get().to(health_check))
            .configure(configure_agent_routes),
    );
}
