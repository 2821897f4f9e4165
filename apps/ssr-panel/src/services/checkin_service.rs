use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::SqlitePool;
use ssr_db::models::user::User;
use ssr_db::repositories::checkin_repo::CheckinRepository;
use tracing::info;

use crate::error::PanelError;
use crate::utils::mb_to_bytes;

/// Reward range in MB (inclusive) and the minimum gap between check-ins.
#[derive(Debug, Clone, Copy)]
pub struct CheckinPolicy {
    pub min_mb: i64,
    pub max_mb: i64,
    pub interval: Duration,
}

impl CheckinPolicy {
    pub fn new(min_mb: i64, max_mb: i64, interval: Duration) -> Self {
        Self {
            min_mb,
            max_mb,
            interval,
        }
    }

    pub fn draw_megabytes(&self) -> i64 {
        rand::rng().random_range(self.min_mb..=self.max_mb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckinReward {
    pub megabytes: i64,
    pub bytes: i64,
}

impl CheckinReward {
    pub fn message(&self) -> String {
        format!("获得了 {} MB流量.", self.megabytes)
    }
}

#[derive(Debug, Clone)]
pub struct CheckinService {
    checkin_repo: CheckinRepository,
    policy: CheckinPolicy,
}

impl CheckinService {
    pub fn new(pool: SqlitePool, policy: CheckinPolicy) -> Self {
        Self {
            checkin_repo: CheckinRepository::new(pool),
            policy,
        }
    }

    pub fn policy(&self) -> &CheckinPolicy {
        &self.policy
    }

    /// Grants the daily bonus to `user`.
    ///
    /// `user` may be stale; eligibility is checked again inside the write
    /// transaction so two concurrent calls cannot both succeed.
    pub async fn checkin(&self, user: &User) -> Result<CheckinReward, PanelError> {
        let now = Utc::now();
        if !user.is_able_to_checkin(now, self.policy.interval) {
            return Err(PanelError::AlreadyCheckedIn);
        }

        let megabytes = self.policy.draw_megabytes();
        let reward = CheckinReward {
            megabytes,
            bytes: mb_to_bytes(megabytes)?,
        };
        let cutoff = now.timestamp() - self.policy.interval.num_seconds();

        let granted = self
            .checkin_repo
            .grant(user.id, reward.bytes, now, cutoff)
            .await
            .map_err(PanelError::CheckinFailed)?;

        match granted {
            Some(log) => {
                info!(
                    "User {} checked in: +{} MB (log #{})",
                    user.id, reward.megabytes, log.id
                );
                Ok(reward)
            }
            None => Err(PanelError::AlreadyCheckedIn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssr_db::db::init_memory_db;
    use ssr_db::models::user::NewUser;
    use ssr_db::repositories::user_repo::UserRepository;

    async fn setup(min: i64, max: i64) -> (CheckinService, UserRepository, CheckinRepository, i64) {
        let pool = init_memory_db().await.unwrap();
        let users = UserRepository::new(pool.clone());
        let id = users
            .create(&NewUser {
                email: "carol@example.com".to_string(),
                user_name: "carol".to_string(),
                pass: "hash".to_string(),
                port: 10010,
                passwd: "Abc-123".to_string(),
                transfer_enable: 0,
            })
            .await
            .unwrap();
        let service = CheckinService::new(
            pool.clone(),
            CheckinPolicy::new(min, max, Duration::hours(22)),
        );
        (service, users, CheckinRepository::new(pool), id)
    }

    #[tokio::test]
    async fn single_megabyte_reward_is_applied_once() {
        let (service, users, logs, id) = setup(1, 1).await;
        let user = users.get_by_id(id).await.unwrap().unwrap();

        let reward = service.checkin(&user).await.unwrap();
        assert_eq!(reward, CheckinReward { megabytes: 1, bytes: 1024 * 1024 });
        assert_eq!(reward.message(), "获得了 1 MB流量.");

        let refreshed = users.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(refreshed.transfer_enable, 1024 * 1024);
        assert!(refreshed.last_check_in_time > 0);
        assert_eq!(logs.count_for_user(id).await.unwrap(), 1);

        let second = service.checkin(&refreshed).await;
        assert!(matches!(second, Err(PanelError::AlreadyCheckedIn)));
        let after = users.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.transfer_enable, 1024 * 1024);
        assert_eq!(logs.count_for_user(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stale_snapshot_cannot_check_in_twice() {
        let (service, users, logs, id) = setup(1, 1).await;
        let stale = users.get_by_id(id).await.unwrap().unwrap();

        service.checkin(&stale).await.unwrap();
        let again = service.checkin(&stale).await;
        assert!(matches!(again, Err(PanelError::AlreadyCheckedIn)));
        assert_eq!(logs.count_for_user(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_checkins_grant_exactly_one_reward() {
        let (service, users, logs, id) = setup(1, 1).await;
        let user = users.get_by_id(id).await.unwrap().unwrap();

        let (a, b) = tokio::join!(service.checkin(&user), service.checkin(&user));
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);

        let refreshed = users.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(refreshed.transfer_enable, 1024 * 1024);
        assert_eq!(logs.count_for_user(id).await.unwrap(), 1);
    }

    #[test]
    fn draws_stay_inside_range() {
        let policy = CheckinPolicy::new(3, 7, Duration::hours(1));
        for _ in 0..200 {
            let mb = policy.draw_megabytes();
            assert!((3..=7).contains(&mb));
        }
    }
}
