mod ai;
mod cache;
mod config;
mod db;
mod errors;
mod insights;
mod interview;
mod job_match;
mod models;
mod rate_limit;
mod resume;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ai::{AiClient, GeminiBackend};
use crate::cache::TtlCache;
use crate::config::Config;
use crate::db::create_pool;
use crate::rate_limit::RateLimiter;
use crate::routes::build_router;
use crate::state::AppState;

/// How often idle rate-limit buckets are swept.
const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);
/// Buckets idle longer than the largest preset window are dropped.
const LIMITER_SWEEP_HORIZON: Duration = Duration::from_secs(86_400);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Horizon API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize the AI client. Model discovery runs once here unless a
    // model is pinned via GEMINI_MODEL.
    let backend = Arc::new(GeminiBackend::new(config.gemini_api_key.clone()));
    let ai = match &config.gemini_model {
        Some(model) => AiClient::new(backend, model.clone()),
        None => AiClient::connect(backend).await?,
    };
    info!("AI client initialized (model: {})", ai.model());

    // In-process request-shaping state
    let cache = Arc::new(TtlCache::new());
    let limiter = Arc::new(RateLimiter::new());

    // Periodic sweep so idle rate-limit buckets do not accumulate
    let sweeper = limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(LIMITER_SWEEP_INTERVAL);
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            ticker.tick().await;
            sweeper.sweep(LIMITER_SWEEP_HORIZON);
        }
    });

    // Build app state
    let state = AppState {
        db,
        ai,
        cache,
        limiter,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
