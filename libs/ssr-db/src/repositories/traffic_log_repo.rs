use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::models::traffic_log::{NewTrafficLog, TrafficLogEntry};

#[derive(Debug, Clone)]
pub struct TrafficLogRepository {
    pool: SqlitePool,
}

impl TrafficLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM traffic_logs WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count traffic logs")
    }

    /// Newest first, joined with the node name.
    pub async fn page_for_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TrafficLogEntry>> {
        sqlx::query_as::<_, TrafficLogEntry>(
            r#"
            SELECT t.id, t.node_id, n.name AS node_name, t.u, t.d, t.rate, t.traffic, t.log_time
            FROM traffic_logs t
            LEFT JOIN nodes n ON n.id = t.node_id
            WHERE t.user_id = ?
            ORDER BY t.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch traffic logs")
    }

    pub async fn insert(&self, log: &NewTrafficLog) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO traffic_logs (user_id, node_id, u, d, rate, traffic, log_time)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(log.user_id)
        .bind(log.node_id)
        .bind(log.u)
        .bind(log.d)
        .bind(log.rate)
        .bind(&log.traffic)
        .bind(log.log_time)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert traffic log")
    }
}
