use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::user::{NewUser, User};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by ID")
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by email")
    }

    pub async fn create(&self, user: &NewUser) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (email, user_name, pass, port, passwd, transfer_enable, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.email)
        .bind(&user.user_name)
        .bind(&user.pass)
        .bind(user.port)
        .bind(&user.passwd)
        .bind(user.transfer_enable)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to create user")
    }

    /// First port above every allocated one, starting at `floor`.
    pub async fn next_free_port(&self, floor: i64) -> Result<i64> {
        let highest: Option<i64> = sqlx::query_scalar("SELECT MAX(port) FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read highest port")?;

        Ok(highest.map(|p| p + 1).unwrap_or(floor).max(floor))
    }

    pub async fn update_credentials(
        &self,
        id: i64,
        passwd: &str,
        method: &str,
        protocol: &str,
        obfs: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE users SET passwd = ?, method = ?, protocol = ?, obfs = ? WHERE id = ?")
            .bind(passwd)
            .bind(method)
            .bind(protocol)
            .bind(obfs)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update proxy credentials")?;
        Ok(())
    }

    /// Returns false when no user has that email.
    pub async fn update_login_password(&self, email: &str, pass_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET pass = ? WHERE email = ?")
            .bind(pass_hash)
            .bind(email)
            .execute(&self.pool)
            .await
            .context("Failed to update login password")?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) fn new_user(email: &str, port: i64) -> NewUser {
    NewUser {
        email: email.to_string(),
        user_name: email.split('@').next().unwrap_or_default().to_string(),
        pass: "hash".to_string(),
        port,
        passwd: "Abc-123".to_string(),
        transfer_enable: 1024,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;

    #[tokio::test]
    async fn create_and_fetch_user_with_defaults() {
        let repo = UserRepository::new(init_memory_db().await.unwrap());
        let id = repo.create(&new_user("bob@example.com", 10001)).await.unwrap();

        let user = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.email, "bob@example.com");
        assert_eq!(user.method, "aes-256-cfb");
        assert_eq!(user.protocol, "origin");
        assert_eq!(user.obfs, "plain");
        assert_eq!(user.obfs_param, None);
        assert_eq!(user.last_check_in_time, 0);

        let by_email = repo.get_by_email("bob@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(id));
    }

    #[tokio::test]
    async fn next_free_port_respects_floor() {
        let repo = UserRepository::new(init_memory_db().await.unwrap());
        assert_eq!(repo.next_free_port(10000).await.unwrap(), 10000);

        repo.create(&new_user("a@example.com", 10000)).await.unwrap();
        repo.create(&new_user("b@example.com", 10007)).await.unwrap();
        assert_eq!(repo.next_free_port(10000).await.unwrap(), 10008);
    }

    #[tokio::test]
    async fn update_credentials_overwrites_four_fields() {
        let repo = UserRepository::new(init_memory_db().await.unwrap());
        let id = repo.create(&new_user("c@example.com", 10002)).await.unwrap();

        repo.update_credentials(id, "New.pass1", "chacha20", "auth_chain_a", "tls1.2_ticket_auth")
            .await
            .unwrap();

        let user = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.passwd, "New.pass1");
        assert_eq!(user.method, "chacha20");
        assert_eq!(user.protocol, "auth_chain_a");
        assert_eq!(user.obfs, "tls1.2_ticket_auth");
    }

    #[tokio::test]
    async fn update_login_password_reports_missing_user() {
        let repo = UserRepository::new(init_memory_db().await.unwrap());
        assert!(!repo.update_login_password("nobody@example.com", "x").await.unwrap());
    }
}
