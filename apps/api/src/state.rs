use std::sync::Arc;

use sqlx::PgPool;

use crate::ai::AiClient;
use crate::cache::TtlCache;
use crate::rate_limit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub ai: AiClient,
    /// Process-wide memoization of expensive AI responses.
    pub cache: Arc<TtlCache>,
    /// Per-(user, action) sliding-window limiter.
    pub limiter: Arc<RateLimiter>,
}
