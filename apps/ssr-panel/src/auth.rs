use axum::{
    extract::FromRequestParts,
    http::{Method, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use ssr_db::models::user::User;

use crate::AppState;
use crate::error::PanelError;

pub const SESSION_COOKIE: &str = "session";
pub const LOGIN_PATH: &str = "/auth/login";

/// The logged-in dashboard user, resolved from the session cookie.
///
/// Page requests without a live session are redirected to the login form;
/// anything else gets a 401 JSON body.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_page = parts.method == Method::GET;
        let reject = || {
            if is_page {
                Redirect::to(LOGIN_PATH).into_response()
            } else {
                PanelError::Unauthorized.into_response()
            }
        };

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Err(reject());
        };

        let user_id = state
            .sessions
            .find_user_id(&token, Utc::now())
            .await
            .map_err(|e| PanelError::Internal(e).into_response())?;
        let Some(user_id) = user_id else {
            tracing::debug!("Session cookie did not match a live session");
            return Err(reject());
        };

        match state.users.get_by_id(user_id).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                tracing::warn!("Session points at missing user {}", user_id);
                Err(reject())
            }
            Err(e) => Err(PanelError::Internal(e).into_response()),
        }
    }
}
