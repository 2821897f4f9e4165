use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::invite::InviteCode;

#[derive(Debug, Clone)]
pub struct InviteRepository {
    pool: SqlitePool,
}

impl InviteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_for_user(&self, user_id: i64) -> Result<Vec<InviteCode>> {
        sqlx::query_as::<_, InviteCode>(
            "SELECT * FROM invite_codes WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch invite codes")
    }

    pub async fn create(&self, user_id: i64, code: &str) -> Result<InviteCode> {
        sqlx::query_as::<_, InviteCode>(
            r#"
            INSERT INTO invite_codes (code, user_id, created_at)
            VALUES (?, ?, ?)
            RETURNING id, code, user_id, created_at
            "#,
        )
        .bind(code)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to create invite code")
    }
}
