use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a session and returns its token.
    pub async fn create(&self, user_id: i64, ttl: Duration) -> Result<String> {
        let token = uuid::Uuid::new_v4().to_string();
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .context("Session lifetime is out of range")?
            .timestamp();

        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .context("Failed to create session")?;

        Ok(token)
    }

    pub async fn find_user_id(&self, token: &str, now: DateTime<Utc>) -> Result<Option<i64>> {
        sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = ? AND expires_at > ?")
            .bind(token)
            .bind(now.timestamp())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up session")
    }

    pub async fn delete(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await
            .context("Failed to purge sessions")?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;
    use crate::repositories::user_repo::{UserRepository, new_user};

    #[tokio::test]
    async fn session_lifecycle() {
        let pool = init_memory_db().await.unwrap();
        let users = UserRepository::new(pool.clone());
        let repo = SessionRepository::new(pool);
        let id = users.create(&new_user("i@example.com", 10008)).await.unwrap();

        let token = repo.create(id, Duration::hours(1)).await.unwrap();
        assert_eq!(repo.find_user_id(&token, Utc::now()).await.unwrap(), Some(id));

        let later = Utc::now() + Duration::hours(2);
        assert_eq!(repo.find_user_id(&token, later).await.unwrap(), None);
        assert_eq!(repo.purge_expired(later).await.unwrap(), 1);

        let token = repo.create(id, Duration::hours(1)).await.unwrap();
        repo.delete(&token).await.unwrap();
        assert_eq!(repo.find_user_id(&token, Utc::now()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unrepresentable_lifetime_is_an_error() {
        let pool = init_memory_db().await.unwrap();
        let users = UserRepository::new(pool.clone());
        let repo = SessionRepository::new(pool);
        let id = users.create(&new_user("j@example.com", 10009)).await.unwrap();

        assert!(repo.create(id, Duration::days(365 * 1_000_000)).await.is_err());
    }
}
