mod config;
mod engine;
mod errors;
mod models;
mod nlu;
mod origin;
mod relay;
mod router;
mod routes;
mod service;

use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::GatewayConfig;
use crate::engine::HttpRecommendationEngine;
use crate::routes::assistant_routes::assistant_handler;
use crate::routes::nova_routes::{health_handler, nova_handler, preflight_handler};
use crate::service::assistant_service::AssistantService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nova_gateway=debug,tower_http=debug".into()),
        )
        .init();

    // ── Dependency wiring ─────────────────────────────────────────────────────
    // Startup snapshot only for the collaborator handle; per-request settings
    // (key, models, origins) are re-read from the environment on every call.
    let startup = GatewayConfig::from_env();
    let engine = Arc::new(HttpRecommendationEngine::new(&startup.engine_url));
    let assistant = AssistantService::new(engine);
    info!("Recommendation engine at {}", startup.engine_url);

    // ── Router ────────────────────────────────────────────────────────────────
    let app = Router::new()
        .route(
            "/api/nova",
            post(nova_handler).get(health_handler).options(preflight_handler),
        )
        .route(
            "/api/nova/assistant",
            post(assistant_handler).options(preflight_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(assistant);

    // ── Listen ────────────────────────────────────────────────────────────────
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}
