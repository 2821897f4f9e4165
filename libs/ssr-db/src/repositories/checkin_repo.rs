use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::checkin_log::CheckinLog;

#[derive(Debug, Clone)]
pub struct CheckinRepository {
    pool: SqlitePool,
}

impl CheckinRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Adds `traffic` bytes to the user's quota, stamps the check-in time and
    /// appends the audit row, all in one transaction.
    ///
    /// The update only matches while `last_check_in_time <= cutoff`, so a
    /// racing request that already checked in makes this return `None` and
    /// nothing is written.
    pub async fn grant(
        &self,
        user_id: i64,
        traffic: i64,
        now: DateTime<Utc>,
        cutoff: i64,
    ) -> Result<Option<CheckinLog>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE users
            SET transfer_enable = transfer_enable + ?, last_check_in_time = ?
            WHERE id = ? AND last_check_in_time <= ?
            "#,
        )
        .bind(traffic)
        .bind(now.timestamp())
        .bind(user_id)
        .bind(cutoff)
        .execute(&mut *tx)
        .await
        .context("Failed to add check-in traffic")?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let log = sqlx::query_as::<_, CheckinLog>(
            r#"
            INSERT INTO checkin_logs (user_id, traffic, created_at)
            VALUES (?, ?, ?)
            RETURNING id, user_id, traffic, created_at
            "#,
        )
        .bind(user_id)
        .bind(traffic)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to write check-in log")?;

        tx.commit().await.context("Failed to commit check-in")?;
        Ok(Some(log))
    }

    pub async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM checkin_logs WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count check-in logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;
    use crate::repositories::user_repo::{UserRepository, new_user};

    #[tokio::test]
    async fn grant_updates_quota_and_logs_once() {
        let pool = init_memory_db().await.unwrap();
        let users = UserRepository::new(pool.clone());
        let repo = CheckinRepository::new(pool);
        let id = users.create(&new_user("d@example.com", 10003)).await.unwrap();

        let now = Utc::now();
        let cutoff = now.timestamp() - 3600;
        let log = repo.grant(id, 2048, now, cutoff).await.unwrap().unwrap();
        assert_eq!(log.traffic, 2048);
        assert_eq!(log.user_id, id);

        let user = users.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.transfer_enable, 1024 + 2048);
        assert_eq!(user.last_check_in_time, now.timestamp());

        // same window again: the guard no longer matches
        assert!(repo.grant(id, 2048, now, cutoff).await.unwrap().is_none());
        let user = users.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.transfer_enable, 1024 + 2048);
        assert_eq!(repo.count_for_user(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn grant_for_missing_user_writes_nothing() {
        let pool = init_memory_db().await.unwrap();
        let repo = CheckinRepository::new(pool);
        let now = Utc::now();
        assert!(repo.grant(99, 10, now, now.timestamp()).await.unwrap().is_none());
        assert_eq!(repo.count_for_user(99).await.unwrap(), 0);
    }
}
