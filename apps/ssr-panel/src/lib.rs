pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pagination;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, header},
    response::Redirect,
    routing::{get, post},
};
use sqlx::SqlitePool;
use ssr_db::repositories::{
    invite_repo::InviteRepository, session_repo::SessionRepository,
    traffic_log_repo::TrafficLogRepository, user_repo::UserRepository,
};
use tower_http::{
    limit::RequestBodyLimitLayer, services::ServeDir, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use config::PanelConfig;
use services::{
    checkin_service::CheckinService, credential_service::CredentialService,
    node_service::NodeService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<PanelConfig>,

    pub users: Arc<UserRepository>,
    pub sessions: Arc<SessionRepository>,
    pub traffic_logs: Arc<TrafficLogRepository>,
    pub invites: Arc<InviteRepository>,

    pub node_service: Arc<NodeService>,
    pub checkin_service: Arc<CheckinService>,
    pub credential_service: Arc<CredentialService>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: PanelConfig) -> Self {
        let checkin_policy = config.checkin_policy();
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            traffic_logs: Arc::new(TrafficLogRepository::new(pool.clone())),
            invites: Arc::new(InviteRepository::new(pool.clone())),
            node_service: Arc::new(NodeService::new(pool.clone())),
            checkin_service: Arc::new(CheckinService::new(pool.clone(), checkin_policy)),
            credential_service: Arc::new(CredentialService::new(pool.clone())),
            config: Arc::new(config),
            pool,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let downloads = ServeDir::new(&state.config.downloads_dir);

    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard/") }))
        .route("/health", get(handlers::health::health))
        .route(auth::LOGIN_PATH, get(handlers::auth::get_login).post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/dashboard", get(handlers::dashboard::index))
        .route("/dashboard/", get(handlers::dashboard::index))
        .route("/dashboard/nodes", get(handlers::nodes::list))
        .route("/dashboard/nodes/{id}", get(handlers::nodes::detail))
        .route("/dashboard/profile", get(handlers::dashboard::profile))
        .route("/dashboard/trafficlog", get(handlers::traffic_log::traffic_log))
        .route("/dashboard/edit", get(handlers::dashboard::edit))
        .route("/dashboard/invite", get(handlers::dashboard::invite))
        .route("/dashboard/checkin", post(handlers::dashboard::checkin))
        .route("/dashboard/ssr_edit", post(handlers::dashboard::ssr_edit))
        .nest_service("/downloads", downloads)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}
