pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::insights::handlers as insights;
use crate::interview::handlers as interview;
use crate::job_match::handlers as job_match;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Insights API
        .route("/api/v1/insights", get(insights::handle_get_insights))
        // Interview API
        .route(
            "/api/v1/interview/quiz",
            post(interview::handle_generate_quiz),
        )
        .route(
            "/api/v1/interview/assessments",
            post(interview::handle_save_assessment).get(interview::handle_list_assessments),
        )
        // Job Match API
        .route(
            "/api/v1/job-match",
            post(job_match::handle_create_job_match).get(job_match::handle_list_job_matches),
        )
        .route(
            "/api/v1/job-match/stats",
            get(job_match::handle_job_match_stats),
        )
        .route(
            "/api/v1/job-match/skill-gap",
            post(job_match::handle_skill_gap),
        )
        .route(
            "/api/v1/job-match/:id",
            get(job_match::handle_get_job_match).delete(job_match::handle_delete_job_match),
        )
        // Resume API
        .route(
            "/api/v1/resumes",
            post(resume::handle_save_resume).get(resume::handle_list_resumes),
        )
        .route(
            "/api/v1/resumes/active",
            get(resume::handle_get_active_resume),
        )
        .route(
            "/api/v1/resumes/improve",
            post(resume::handle_improve_resume),
        )
        .route(
            "/api/v1/resumes/:id/activate",
            patch(resume::handle_activate_resume),
        )
        .route("/api/v1/resumes/:id", delete(resume::handle_delete_resume))
        .with_state(state)
}
