use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IndustryInsightRow {
    pub id: Uuid,
    pub industry: String,
    /// The validated `IndustryInsights` payload as stored JSON.
    pub data: Value,
    /// Stored insights are regenerated once this passes.
    pub next_update: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
