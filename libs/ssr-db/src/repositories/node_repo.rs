use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::models::node::{NewNode, Node};

#[derive(Debug, Clone)]
pub struct NodeRepository {
    pool: SqlitePool,
}

impl NodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_node_by_id(&self, id: i64) -> Result<Option<Node>> {
        sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch node by ID")
    }

    /// Nodes of the given group plus the shared group 0.
    pub async fn get_nodes_for_group(&self, node_group: i64) -> Result<Vec<Node>> {
        sqlx::query_as::<_, Node>(
            "SELECT * FROM nodes WHERE node_group = ? OR node_group = 0 ORDER BY sort ASC, id ASC",
        )
        .bind(node_group)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch nodes for group")
    }

    pub async fn create_node(&self, node: &NewNode) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO nodes (name, server, info, node_class, node_group, traffic_rate)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&node.name)
        .bind(&node.server)
        .bind(&node.info)
        .bind(node.node_class)
        .bind(node.node_group)
        .bind(node.traffic_rate)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create node")
    }
}

#[cfg(test)]
pub(crate) fn new_node(name: &str, node_class: i64, node_group: i64) -> NewNode {
    NewNode {
        name: name.to_string(),
        server: format!("{}.example.com", name.to_lowercase()),
        info: String::new(),
        node_class,
        node_group,
        traffic_rate: 1.0,
    }
}
