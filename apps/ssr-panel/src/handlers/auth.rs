use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{info, warn};

use crate::AppState;
use crate::auth::{LOGIN_PATH, SESSION_COOKIE};
use crate::error::PanelError;

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub async fn get_login() -> impl IntoResponse {
    LoginTemplate {
        email: String::new(),
        error: None,
    }
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, PanelError> {
    let email = form.email.trim();
    let user = state.users.get_by_email(email).await?;

    let verified = user.filter(|u| bcrypt::verify(&form.password, &u.pass).unwrap_or(false));
    let Some(user) = verified else {
        warn!("Login failed for {}", email);
        let page = LoginTemplate {
            email: email.to_string(),
            error: Some("邮箱或者密码错误".to_string()),
        };
        return Ok((StatusCode::UNAUTHORIZED, page).into_response());
    };

    let ttl = state.config.session_ttl();
    let token = state.sessions.create(user.id, ttl).await?;
    info!("User {} logged in", user.id);

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build();

    Ok((jar.add(cookie), Redirect::to("/dashboard/")).into_response())
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, PanelError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.delete(cookie.value()).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Redirect::to(LOGIN_PATH)).into_response())
}
