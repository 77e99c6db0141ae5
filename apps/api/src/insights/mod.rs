//! Industry Insights — AI market analysis per industry.
//!
//! Flow: cache lookup → on miss, one validated JSON generation →
//! cache for 6 hours. The handler layer persists a row with a 7-day
//! refresh horizon so the dashboard survives process restarts.

pub mod handlers;
pub mod prompts;

use std::time::Duration;

use tracing::{debug, info};

use crate::ai::schemas::IndustryInsights;
use crate::ai::{AiClient, AiError, RetryPolicy};
use crate::cache::TtlCache;
use crate::errors::AppError;

const INSIGHTS_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Days until a persisted insight row is considered stale.
pub const INSIGHT_REFRESH_DAYS: i64 = 7;

/// Cache key: `insights:<industry>`, personalized with the user's sorted
/// skills when present so two users with different skills never collide.
pub fn insights_cache_key(industry: &str, skills: &[String]) -> String {
    if skills.is_empty() {
        format!("insights:{industry}")
    } else {
        let mut sorted = skills.to_vec();
        sorted.sort();
        format!("insights:{industry}:{}", sorted.join("-"))
    }
}

/// Returns insights for `industry`, serving from cache when possible.
pub async fn generate_industry_insights(
    ai: &AiClient,
    cache: &TtlCache,
    industry: &str,
    skills: &[String],
) -> Result<IndustryInsights, AppError> {
    let key = insights_cache_key(industry, skills);

    if let Some(cached) = cache.get(&key) {
        debug!("Serving cached insights for {industry}");
        let insights: IndustryInsights =
            serde_json::from_value(cached).map_err(AiError::from)?;
        return Ok(insights);
    }

    let prompt = prompts::build_insights_prompt(industry, skills);
    let insights: IndustryInsights = ai.generate_json(&prompt, &RetryPolicy::retries(1)).await?;
    info!("Generated insights for {industry}");

    let value = serde_json::to_value(&insights).map_err(AiError::from)?;
    cache.set(&key, value, Some(INSIGHTS_CACHE_TTL));
    Ok(insights)
}
