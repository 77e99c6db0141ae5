use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::schemas::{Quiz, QuizQuestion};
use crate::ai::{AiError, RetryPolicy};
use crate::errors::AppError;
use crate::interview::{grade_answers, prompts};
use crate::models::assessment::AssessmentRow;
use crate::models::user::fetch_user;
use crate::rate_limit::RateLimitConfig;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct GenerateQuizRequest {
    pub user_id: Uuid,
}

/// POST /api/v1/interview/quiz
///
/// Rate-limited quiz generation from the user's industry and skills.
pub async fn handle_generate_quiz(
    State(state): State<AppState>,
    Json(req): Json<GenerateQuizRequest>,
) -> Result<Json<Vec<QuizQuestion>>, AppError> {
    let decision = state
        .limiter
        .check(req.user_id, "quiz", &RateLimitConfig::QUIZ);
    if !decision.allowed {
        return Err(AppError::RateLimited {
            retry_after_secs: decision.retry_after_secs(),
        });
    }

    let user = fetch_user(&state.db, req.user_id).await?;
    let industry = user
        .industry
        .ok_or_else(|| AppError::Validation("User has no industry set".to_string()))?;

    let prompt = prompts::build_quiz_prompt(&industry, &user.skills);
    let quiz: Quiz = state.ai.generate_json(&prompt, &RetryPolicy::retries(2)).await?;
    info!(
        "Generated {} quiz questions for user {}",
        quiz.questions.len(),
        req.user_id
    );

    Ok(Json(quiz.questions))
}

#[derive(Deserialize)]
pub struct SaveAssessmentRequest {
    pub user_id: Uuid,
    pub questions: Vec<QuizQuestion>,
    pub answers: Vec<String>,
    pub score: f64,
}

/// POST /api/v1/interview/assessments
///
/// Grades the submitted answers, asks for an improvement tip when any
/// were wrong, and persists the assessment.
pub async fn handle_save_assessment(
    State(state): State<AppState>,
    Json(req): Json<SaveAssessmentRequest>,
) -> Result<Json<AssessmentRow>, AppError> {
    let user = fetch_user(&state.db, req.user_id).await?;

    let results = grade_answers(&req.questions, &req.answers);
    let wrong: Vec<_> = results.iter().filter(|r| !r.is_correct).collect();

    let improvement_tip = if wrong.is_empty() {
        None
    } else {
        let prompt = prompts::build_improvement_tip_prompt(&wrong);
        match state.ai.generate_text(&prompt, &RetryPolicy::retries(1)).await {
            Ok(tip) => Some(tip),
            Err(e) => {
                // The assessment still saves without a tip.
                warn!("Improvement tip generation failed: {e}");
                None
            }
        }
    };

    let questions = serde_json::to_value(&results).map_err(AiError::from)?;

    let row: AssessmentRow = sqlx::query_as(
        "INSERT INTO assessments \
         (id, user_id, quiz_score, questions, category, improvement_tip, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(req.score)
    .bind(&questions)
    .bind("Technical")
    .bind(&improvement_tip)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row))
}

/// GET /api/v1/interview/assessments
pub async fn handle_list_assessments(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<AssessmentRow>>, AppError> {
    let user = fetch_user(&state.db, params.user_id).await?;

    let assessments: Vec<AssessmentRow> =
        sqlx::query_as("SELECT * FROM assessments WHERE user_id = $1 ORDER BY created_at ASC")
            .bind(user.id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(assessments))
}
