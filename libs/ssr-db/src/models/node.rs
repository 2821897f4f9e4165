use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Node {
    pub id: i64,
    pub name: String,
    pub server: String,
    pub info: String,
    pub status: String,
    pub node_class: i64,
    /// 0 means the node is shared by every group
    pub node_group: i64,
    pub traffic_rate: f64,
    pub sort: i64,
}

#[derive(Debug, Clone)]
pub struct NewNode {
    pub name: String,
    pub server: String,
    pub info: String,
    pub node_class: i64,
    pub node_group: i64,
    pub traffic_rate: f64,
}

#[cfg(test)]
pub(crate) fn sample_node(node_class: i64, node_group: i64) -> Node {
    Node {
        id: 1,
        name: "Tokyo 01".to_string(),
        server: "jp1.example.com".to_string(),
        info: String::new(),
        status: "ok".to_string(),
        node_class,
        node_group,
        traffic_rate: 1.0,
        sort: 0,
    }
}
