use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub industry: Option<String>,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Loads a user or fails with 404. Every AI action starts here.
pub async fn fetch_user(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    user.ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}
