use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobMatchRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub ats_score: i32,
    pub match_percentage: i32,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub suggestions: Value,
    pub alignment_notes: String,
    pub improvement_tips: Vec<String>,
    /// The resume content the analysis ran against.
    pub resume_snapshot: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregates over a user's job matches.
#[derive(Debug, Clone, Serialize)]
pub struct JobMatchStats {
    pub total_matches: u32,
    pub average_ats_score: u32,
    pub average_match_percentage: u32,
    pub highest_ats_score: i32,
    pub lowest_ats_score: i32,
}
