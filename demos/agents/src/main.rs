use std::env;

use actix_web::{middleware, App, HttpServer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agenthub_demo_agents::DemoAgent;

fn port_for(agent: DemoAgent) -> std::io::Result<u16> {
    match env::var(agent.port_var()) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid {}: {raw}", agent.port_var()),
            )
        }),
        Err(_) => Ok(agent.default_port()),
    }
}

fn serve(agent: DemoAgent, host: &str) -> std::io::Result<actix_web::dev::Server> {
    let addr = format!("{host}:{}", port_for(agent)?);
    info!("{} listening on http://{addr}/run", agent.name());

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .configure(|cfg| agent.configure(cfg))
    })
    .workers(1)
    .bind(&addr)?
    .run())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demo_agents=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = env::var("DEMO_AGENT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

    let [summarize, translate, keywords] = DemoAgent::ALL;
    tokio::try_join!(
        serve(summarize, &host)?,
        serve(translate, &host)?,
        serve(keywords, &host)?,
    )?;

    Ok(())
}
