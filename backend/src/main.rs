use actix_web::{middleware, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agenthub::{build_state, handlers, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agenthub=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    info!("Starting AgentHub server on {}:{}", config.host, config.port);

    let server_addr = format!("{}:{}", config.host, config.port);
    let rate_limit = config.rate_limit.clone();

    let app_state = web::Data::new(
        build_state(config)
            .await
            .expect("Failed to initialize application state"),
    );

    info!("Database ready and migrations applied");
    info!(
        "Rate limiter allows {} requests per {}s per API key",
        rate_limit.max_requests, rate_limit.window_secs
    );

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(handlers::configure_routes)
    })
    .bind(&server_addr)?
    .run()
    .await
}
