use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::ai::AiError;
use crate::errors::AppError;
use crate::job_match::analysis::{
    analyze_job_match, analyze_skill_gap, JobMatchAnalysis, SkillGapAnalysis,
};
use crate::models::job_match::{JobMatchRow, JobMatchStats};
use crate::models::resume::ResumeRow;
use crate::models::user::fetch_user;
use crate::rate_limit::RateLimitConfig;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateJobMatchRequest {
    pub user_id: Uuid,
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
}

/// POST /api/v1/job-match
///
/// Rate-limited analysis of the user's active resume against a job
/// description; the result (and a resume snapshot) is persisted.
pub async fn handle_create_job_match(
    State(state): State<AppState>,
    Json(req): Json<CreateJobMatchRequest>,
) -> Result<Json<JobMatchRow>, AppError> {
    let decision = state
        .limiter
        .check(req.user_id, "job_match", &RateLimitConfig::JOB_MATCH);
    if !decision.allowed {
        return Err(AppError::RateLimited {
            retry_after_secs: decision.retry_after_secs(),
        });
    }

    if req.job_title.trim().is_empty()
        || req.company_name.trim().is_empty()
        || req.job_description.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Job title, company name, and job description are required".to_string(),
        ));
    }

    let user = fetch_user(&state.db, req.user_id).await?;

    let resume: Option<ResumeRow> = sqlx::query_as(
        "SELECT * FROM resumes WHERE user_id = $1 \
         ORDER BY is_active DESC, created_at DESC LIMIT 1",
    )
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;
    let resume =
        resume.ok_or_else(|| AppError::Validation("Please create a resume first".to_string()))?;

    let analysis: JobMatchAnalysis = analyze_job_match(
        &state.ai,
        &state.cache,
        &resume.content,
        &req.job_description,
        &req.job_title,
        &req.company_name,
        user.id,
    )
    .await?;

    let suggestions = serde_json::to_value(&analysis.suggestions).map_err(AiError::from)?;

    let row: JobMatchRow = sqlx::query_as(
        "INSERT INTO job_matches \
         (id, user_id, job_title, company_name, job_description, ats_score, \
          match_percentage, matched_keywords, missing_keywords, suggestions, \
          alignment_notes, improvement_tips, resume_snapshot, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&req.job_title)
    .bind(&req.company_name)
    .bind(&req.job_description)
    .bind(analysis.ats_score as i32)
    .bind(analysis.match_percentage as i32)
    .bind(&analysis.matched_keywords)
    .bind(&analysis.missing_keywords)
    .bind(&suggestions)
    .bind(&analysis.alignment_notes)
    .bind(&analysis.improvement_tips)
    .bind(&resume.content)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row))
}

/// GET /api/v1/job-match
pub async fn handle_list_job_matches(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<JobMatchRow>>, AppError> {
    let user = fetch_user(&state.db, params.user_id).await?;

    let matches: Vec<JobMatchRow> = sqlx::query_as(
        "SELECT * FROM job_matches WHERE user_id = $1 ORDER BY created_at DESC LIMIT 50",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(matches))
}

/// GET /api/v1/job-match/:id
pub async fn handle_get_job_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<JobMatchRow>, AppError> {
    let row: Option<JobMatchRow> =
        sqlx::query_as("SELECT * FROM job_matches WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(params.user_id)
            .fetch_optional(&state.db)
            .await?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("Job match {id} not found")))?;
    Ok(Json(row))
}

/// DELETE /api/v1/job-match/:id
pub async fn handle_delete_job_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM job_matches WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Job match {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct SkillGapRequest {
    pub user_id: Uuid,
    pub job_description: String,
}

/// POST /api/v1/job-match/skill-gap
pub async fn handle_skill_gap(
    State(state): State<AppState>,
    Json(req): Json<SkillGapRequest>,
) -> Result<Json<SkillGapAnalysis>, AppError> {
    let decision = state
        .limiter
        .check(req.user_id, "skill_gap", &RateLimitConfig::SKILL_GAP);
    if !decision.allowed {
        return Err(AppError::RateLimited {
            retry_after_secs: decision.retry_after_secs(),
        });
    }

    let user = fetch_user(&state.db, req.user_id).await?;
    let analysis = analyze_skill_gap(&state.ai, &user.skills, &req.job_description).await?;
    Ok(Json(analysis))
}

#[derive(Debug, FromRow)]
struct ScoreRow {
    ats_score: i32,
    match_percentage: i32,
}

/// GET /api/v1/job-match/stats
pub async fn handle_job_match_stats(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<JobMatchStats>, AppError> {
    let user = fetch_user(&state.db, params.user_id).await?;

    let scores: Vec<ScoreRow> =
        sqlx::query_as("SELECT ats_score, match_percentage FROM job_matches WHERE user_id = $1")
            .bind(user.id)
            .fetch_all(&state.db)
            .await?;

    if scores.is_empty() {
        return Ok(Json(JobMatchStats {
            total_matches: 0,
            average_ats_score: 0,
            average_match_percentage: 0,
            highest_ats_score: 0,
            lowest_ats_score: 0,
        }));
    }

    let total = scores.len() as u32;
    let avg_ats =
        scores.iter().map(|s| s.ats_score as f64).sum::<f64>() / scores.len() as f64;
    let avg_match = scores.iter().map(|s| s.match_percentage as f64).sum::<f64>()
        / scores.len() as f64;

    Ok(Json(JobMatchStats {
        total_matches: total,
        average_ats_score: avg_ats.round() as u32,
        average_match_percentage: avg_match.round() as u32,
        highest_ats_score: scores.iter().map(|s| s.ats_score).max().unwrap_or(0),
        lowest_ats_score: scores.iter().map(|s| s.ats_score).min().unwrap_or(0),
    }))
}
