use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::PanelError;
use crate::services::link_service::{NodeEndpoint, ProxyCredentials, encode_node_links};
use crate::utils::asset_base;

pub struct NodeRow {
    pub id: i64,
    pub name: String,
    pub info: String,
    pub status: String,
    pub traffic_rate: String,
    pub locked: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "nodes.html")]
pub struct NodesTemplate {
    pub user_name: String,
    pub active_page: &'static str,
    pub nodes: Vec<NodeRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "node_detail.html")]
pub struct NodeDetailTemplate {
    pub user_name: String,
    pub active_page: &'static str,
    pub node_name: String,
    pub ss_info: String,
    pub primary: String,
    pub ss: String,
    pub ss_extended: String,
    pub ssr: String,
    pub extended_required: bool,
    pub surge_base: String,
    pub surge_proxy: String,
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, PanelError> {
    let nodes = state
        .node_service
        .list_for(&user)
        .await?
        .into_iter()
        .map(|listing| NodeRow {
            id: listing.node.id,
            name: listing.node.name,
            info: listing.node.info,
            status: listing.node.status,
            traffic_rate: format!("{:.1}", listing.node.traffic_rate),
            locked: listing.locked,
        })
        .collect();

    Ok(NodesTemplate {
        user_name: user.user_name,
        active_page: "nodes",
        nodes,
    })
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(node_id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, PanelError> {
    let node = state.node_service.detail(&user, node_id).await?;
    let base = asset_base(&headers, &state.config);
    let links = encode_node_links(
        &ProxyCredentials::from(&user),
        &NodeEndpoint::from(&node),
        &base,
    );

    Ok(NodeDetailTemplate {
        user_name: user.user_name.clone(),
        active_page: "nodes",
        node_name: node.name.clone(),
        ss_info: links.info_json(),
        primary: links.primary().to_string(),
        extended_required: links.extended_required,
        surge_base: links.surge.base_url,
        surge_proxy: links.surge.proxy,
        ss: links.ss,
        ss_extended: links.ss_extended,
        ssr: links.ssr,
    })
}
