use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::RetryPolicy;
use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeSummary};
use crate::models::user::fetch_user;
use crate::resume::prompts;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct SaveResumeRequest {
    pub user_id: Uuid,
    pub content: String,
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    "My Resume".to_string()
}

/// POST /api/v1/resumes
///
/// Saves a builder resume as the active one; the user's other resumes
/// are deactivated.
pub async fn handle_save_resume(
    State(state): State<AppState>,
    Json(req): Json<SaveResumeRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    let user = fetch_user(&state.db, req.user_id).await?;

    let now = Utc::now();
    let resume: ResumeRow = sqlx::query_as(
        "INSERT INTO resumes \
         (id, user_id, title, content, source_type, file_name, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, 'builder', NULL, TRUE, $5, $5) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&req.title)
    .bind(&req.content)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    sqlx::query("UPDATE resumes SET is_active = FALSE WHERE user_id = $1 AND id <> $2")
        .bind(user.id)
        .bind(resume.id)
        .execute(&state.db)
        .await?;

    Ok(Json(resume))
}

/// GET /api/v1/resumes/active
///
/// The active resume, or the most recently created when none is flagged.
pub async fn handle_get_active_resume(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeRow>, AppError> {
    let user = fetch_user(&state.db, params.user_id).await?;

    let resume: Option<ResumeRow> = sqlx::query_as(
        "SELECT * FROM resumes WHERE user_id = $1 \
         ORDER BY is_active DESC, created_at DESC LIMIT 1",
    )
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;

    let resume = resume.ok_or_else(|| AppError::NotFound("No resume found".to_string()))?;
    Ok(Json(resume))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    let user = fetch_user(&state.db, params.user_id).await?;

    let resumes: Vec<ResumeSummary> = sqlx::query_as(
        "SELECT id, title, source_type, file_name, is_active, created_at, updated_at \
         FROM resumes WHERE user_id = $1 ORDER BY is_active DESC, created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(resumes))
}

#[derive(Deserialize)]
pub struct ActivateResumeRequest {
    pub user_id: Uuid,
}

/// PATCH /api/v1/resumes/:id/activate
pub async fn handle_activate_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActivateResumeRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    let user = fetch_user(&state.db, req.user_id).await?;

    sqlx::query("UPDATE resumes SET is_active = FALSE WHERE user_id = $1")
        .bind(user.id)
        .execute(&state.db)
        .await?;

    let resume: Option<ResumeRow> = sqlx::query_as(
        "UPDATE resumes SET is_active = TRUE, updated_at = $3 \
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user.id)
    .bind(Utc::now())
    .fetch_optional(&state.db)
    .await?;

    let resume = resume.ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(resume))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let user = fetch_user(&state.db, params.user_id).await?;

    let result = sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ImproveRequest {
    pub user_id: Uuid,
    pub current: String,
    /// The section being improved: "experience", "project", "summary", ...
    pub kind: String,
}

#[derive(Serialize)]
pub struct ImproveResponse {
    pub improved: String,
}

/// POST /api/v1/resumes/improve
///
/// Rewrites one section description as a single improved paragraph.
pub async fn handle_improve_resume(
    State(state): State<AppState>,
    Json(req): Json<ImproveRequest>,
) -> Result<Json<ImproveResponse>, AppError> {
    let user = fetch_user(&state.db, req.user_id).await?;
    let industry = user.industry.unwrap_or_else(|| "technology".to_string());

    let prompt = prompts::build_improve_prompt(&req.kind, &industry, &req.current);
    let improved = state
        .ai
        .generate_text(&prompt, &RetryPolicy::retries(1))
        .await?;

    Ok(Json(ImproveResponse { improved }))
}
