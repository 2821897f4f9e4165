use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::PanelError;
use crate::pagination::{PageLink, PageParams, Pagination};
use crate::utils::{format_bytes_str, format_timestamp};

pub struct TrafficRow {
    pub id: i64,
    pub node_name: String,
    pub upload: String,
    pub download: String,
    pub rate: String,
    pub traffic: String,
    pub log_time: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "traffic_log.html")]
pub struct TrafficLogTemplate {
    pub user_name: String,
    pub active_page: &'static str,
    pub logs: Vec<TrafficRow>,
    pub pagination: Pagination,
    pub page_links: Vec<PageLink>,
}

pub async fn traffic_log(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, PanelError> {
    let total = state.traffic_logs.count_for_user(user.id).await?;
    let pagination = Pagination::new(&params, total);

    let logs = state
        .traffic_logs
        .page_for_user(user.id, pagination.per_page, pagination.offset())
        .await?
        .into_iter()
        .map(|log| TrafficRow {
            id: log.id,
            node_name: log.node_name.unwrap_or_else(|| "-".to_string()),
            upload: format_bytes_str(log.u),
            download: format_bytes_str(log.d),
            rate: format!("{:.1}", log.rate),
            traffic: log.traffic,
            log_time: format_timestamp(log.log_time),
        })
        .collect();

    Ok(TrafficLogTemplate {
        user_name: user.user_name,
        active_page: "trafficlog",
        logs,
        page_links: pagination.links(),
        pagination,
    })
}
