use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InviteCode {
    pub id: i64,
    pub code: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}
