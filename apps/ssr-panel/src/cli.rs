use anyhow::{Context, Result};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::SqlitePool;
use ssr_db::models::user::NewUser;
use ssr_db::repositories::invite_repo::InviteRepository;
use ssr_db::repositories::user_repo::UserRepository;

/// Ports below this are never handed out to proxy accounts.
pub const FIRST_PROXY_PORT: i64 = 10000;

fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    password: &str,
    port: Option<i64>,
    transfer_enable: i64,
) -> Result<i64> {
    let users = UserRepository::new(pool.clone());
    if users.get_by_email(email).await?.is_some() {
        anyhow::bail!("User '{}' already exists", email);
    }

    let pass = bcrypt::hash(password, bcrypt::DEFAULT_COST).context("Failed to hash password")?;
    let port = match port {
        Some(p) => p,
        None => users.next_free_port(FIRST_PROXY_PORT).await?,
    };
    let user_name = email.split('@').next().unwrap_or(email).to_string();

    let id = users
        .create(&NewUser {
            email: email.to_string(),
            user_name,
            pass,
            port,
            passwd: random_token(8),
            transfer_enable,
        })
        .await?;

    println!("User '{}' created with id {} on port {}.", email, id, port);
    Ok(id)
}

pub async fn reset_password(pool: &SqlitePool, email: &str, new_pass: &str) -> Result<()> {
    let hash = bcrypt::hash(new_pass, bcrypt::DEFAULT_COST).context("Failed to hash password")?;

    let updated = UserRepository::new(pool.clone())
        .update_login_password(email, &hash)
        .await?;

    if !updated {
        anyhow::bail!("No user with email '{}'", email);
    }
    println!("Password for '{}' has been successfully reset.", email);
    Ok(())
}

/// Issues `count` fresh invite codes owned by the user with `email`.
pub async fn issue_invites(pool: &SqlitePool, email: &str, count: u32) -> Result<Vec<String>> {
    let user = UserRepository::new(pool.clone())
        .get_by_email(email)
        .await?
        .with_context(|| format!("No user with email '{}'", email))?;

    let invites = InviteRepository::new(pool.clone());
    let mut codes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let invite = invites.create(user.id, &random_token(16)).await?;
        println!("{}", invite.code);
        codes.push(invite.code);
    }
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssr_db::db::init_memory_db;

    #[tokio::test]
    async fn created_users_get_sequential_ports_and_a_valid_proxy_password() {
        let pool = init_memory_db().await.unwrap();
        let first = create_user(&pool, "a@example.com", "secret", None, 0).await.unwrap();
        let second = create_user(&pool, "b@example.com", "secret", None, 0).await.unwrap();

        let users = UserRepository::new(pool.clone());
        let a = users.get_by_id(first).await.unwrap().unwrap();
        let b = users.get_by_id(second).await.unwrap().unwrap();
        assert_eq!(a.port, FIRST_PROXY_PORT);
        assert_eq!(b.port, FIRST_PROXY_PORT + 1);
        assert_eq!(a.user_name, "a");
        assert!(crate::services::credential_service::is_valid_password(&a.passwd));
        assert!(bcrypt::verify("secret", &a.pass).unwrap());

        assert!(create_user(&pool, "a@example.com", "x", None, 0).await.is_err());
    }

    #[tokio::test]
    async fn reset_password_requires_existing_user() {
        let pool = init_memory_db().await.unwrap();
        assert!(reset_password(&pool, "ghost@example.com", "pw").await.is_err());

        create_user(&pool, "c@example.com", "old", Some(12000), 0).await.unwrap();
        reset_password(&pool, "c@example.com", "new").await.unwrap();
        let user = UserRepository::new(pool).get_by_email("c@example.com").await.unwrap().unwrap();
        assert!(bcrypt::verify("new", &user.pass).unwrap());
        assert_eq!(user.port, 12000);
    }

    #[tokio::test]
    async fn invites_are_issued_to_existing_users_only() {
        let pool = init_memory_db().await.unwrap();
        assert!(issue_invites(&pool, "ghost@example.com", 1).await.is_err());

        let id = create_user(&pool, "d@example.com", "pw", None, 0).await.unwrap();
        let codes = issue_invites(&pool, "d@example.com", 3).await.unwrap();
        assert_eq!(codes.len(), 3);
        assert!(codes.iter().all(|c| c.len() == 16));

        let stored = InviteRepository::new(pool).get_for_user(id).await.unwrap();
        assert_eq!(stored.len(), 3);
    }
}
