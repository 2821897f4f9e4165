use serde::Serialize;
use sqlx::FromRow;

/// A traffic log row joined with the name of the node it was recorded on.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrafficLogEntry {
    pub id: i64,
    pub node_id: i64,
    pub node_name: Option<String>,
    pub u: i64,
    pub d: i64,
    pub rate: f64,
    pub traffic: String,
    pub log_time: i64,
}

#[derive(Debug, Clone)]
pub struct NewTrafficLog {
    pub user_id: i64,
    pub node_id: i64,
    pub u: i64,
    pub d: i64,
    pub rate: f64,
    pub traffic: String,
    pub log_time: i64,
}
