use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::ai::AiError;
use crate::errors::AppError;
use crate::insights::{generate_industry_insights, INSIGHT_REFRESH_DAYS};
use crate::models::insight::IndustryInsightRow;
use crate::models::user::fetch_user;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/v1/insights
///
/// Returns the stored insight row for the user's industry, regenerating
/// it when none exists or its refresh horizon has passed.
pub async fn handle_get_insights(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<IndustryInsightRow>, AppError> {
    let user = fetch_user(&state.db, params.user_id).await?;
    let industry = user
        .industry
        .ok_or_else(|| AppError::Validation("User has no industry set".to_string()))?;

    let existing: Option<IndustryInsightRow> = sqlx::query_as(
        "SELECT * FROM industry_insights WHERE industry = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(&industry)
    .fetch_optional(&state.db)
    .await?;

    if let Some(row) = existing {
        if Utc::now() <= row.next_update {
            return Ok(Json(row));
        }
    }

    let insights =
        generate_industry_insights(&state.ai, &state.cache, &industry, &user.skills).await?;
    let data = serde_json::to_value(&insights).map_err(AiError::from)?;

    let row: IndustryInsightRow = sqlx::query_as(
        "INSERT INTO industry_insights (id, industry, data, next_update, created_at) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&industry)
    .bind(&data)
    .bind(Utc::now() + Duration::days(INSIGHT_REFRESH_DAYS))
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row))
}
