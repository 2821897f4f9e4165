use axum::{
    Json,
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced to dashboard users. Messages are the localized text shown
/// in the page; internal causes are only logged.
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
    #[error("您似乎已经签到过了...")]
    AlreadyCheckedIn,
    #[error("节点不存在")]
    NodeNotFound(i64),
    #[error("您没有权限访问该节点")]
    Forbidden,
    #[error("请先登录")]
    Unauthorized,
    #[error("表单格式错误")]
    BadForm(#[from] FormRejection),
    #[error("签到失败，请稍候再试.")]
    CheckinFailed(#[source] anyhow::Error),
    #[error("服务器内部错误")]
    Internal(#[from] anyhow::Error),
}

impl PanelError {
    pub fn status(&self) -> StatusCode {
        match self {
            PanelError::Validation { .. } | PanelError::AlreadyCheckedIn => StatusCode::BAD_REQUEST,
            PanelError::NodeNotFound(_) => StatusCode::NOT_FOUND,
            PanelError::Forbidden => StatusCode::FORBIDDEN,
            PanelError::Unauthorized => StatusCode::UNAUTHORIZED,
            PanelError::BadForm(rejection) => rejection.status(),
            PanelError::CheckinFailed(_) | PanelError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PanelError {
    fn into_response(self) -> Response {
        match &self {
            PanelError::CheckinFailed(e) | PanelError::Internal(e) => {
                error!("Request failed: {:#}", e);
            }
            PanelError::Validation { field, .. } => {
                tracing::debug!("Rejected field '{}'", field);
            }
            PanelError::BadForm(rejection) => {
                tracing::debug!("Rejected form body: {}", rejection.body_text());
            }
            _ => {}
        }
        (self.status(), Json(json!({ "msg": self.to_string() }))).into_response()
    }
}
