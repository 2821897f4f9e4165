use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::node::Node;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub user_name: String,
    /// bcrypt hash of the dashboard login password
    #[serde(skip_serializing)]
    pub pass: String,
    pub port: i64,
    /// Proxy connection password, not the login password
    pub passwd: String,
    pub method: String,
    pub protocol: String,
    pub obfs: String,
    pub obfs_param: Option<String>,
    /// Traffic quota in bytes
    pub transfer_enable: i64,
    pub u: i64,
    pub d: i64,
    /// Unix seconds, 0 when the user never checked in
    pub last_check_in_time: i64,
    pub user_class: i64,
    pub node_group: i64,
    pub invite_num: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub user_name: String,
    pub pass: String,
    pub port: i64,
    pub passwd: String,
    pub transfer_enable: i64,
}

impl User {
    pub fn used_traffic(&self) -> i64 {
        self.u + self.d
    }

    pub fn unused_traffic(&self) -> i64 {
        (self.transfer_enable - self.used_traffic()).max(0)
    }

    pub fn last_check_in_at(&self) -> Option<DateTime<Utc>> {
        if self.last_check_in_time <= 0 {
            return None;
        }
        DateTime::from_timestamp(self.last_check_in_time, 0)
    }

    /// A user may check in again once `interval` has passed since the last check-in.
    pub fn is_able_to_checkin(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        match self.last_check_in_at() {
            None => true,
            Some(last) => now - last >= interval,
        }
    }

    /// Tier must be high enough and the node must sit in the user's group or the shared group 0.
    pub fn can_access(&self, node: &Node) -> bool {
        self.user_class >= node.node_class
            && (self.node_group == node.node_group || node.node_group == 0)
    }
}

#[cfg(test)]
pub(crate) fn sample_user(user_class: i64, node_group: i64) -> User {
    User {
        id: 1,
        email: "alice@example.com".to_string(),
        user_name: "alice".to_string(),
        pass: String::new(),
        port: 10001,
        passwd: "Abc-123".to_string(),
        method: "aes-256-cfb".to_string(),
        protocol: "origin".to_string(),
        obfs: "plain".to_string(),
        obfs_param: None,
        transfer_enable: 0,
        u: 0,
        d: 0,
        last_check_in_time: 0,
        user_class,
        node_group,
        invite_num: 0,
        created_at: Utc::now(),
    }
}
