use sqlx::SqlitePool;
use ssr_db::models::node::Node;
use ssr_db::models::user::User;
use ssr_db::repositories::node_repo::NodeRepository;

use crate::error::PanelError;

#[derive(Debug, Clone)]
pub struct NodeListing {
    pub node: Node,
    /// The node is in the user's group but requires a higher class
    pub locked: bool,
}

#[derive(Debug, Clone)]
pub struct NodeService {
    node_repo: NodeRepository,
}

impl NodeService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            node_repo: NodeRepository::new(pool),
        }
    }

    pub async fn list_for(&self, user: &User) -> Result<Vec<NodeListing>, PanelError> {
        let nodes = self.node_repo.get_nodes_for_group(user.node_group).await?;
        Ok(nodes
            .into_iter()
            .map(|node| NodeListing {
                locked: !user.can_access(&node),
                node,
            })
            .collect())
    }

    pub async fn detail(&self, user: &User, node_id: i64) -> Result<Node, PanelError> {
        let node = self
            .node_repo
            .get_node_by_id(node_id)
            .await?
            .ok_or(PanelError::NodeNotFound(node_id))?;

        if !user.can_access(&node) {
            tracing::warn!("User {} denied access to node {}", user.id, node_id);
            return Err(PanelError::Forbidden);
        }
        Ok(node)
    }
}
