use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::{Value, json};
use ssr_db::models::user::User;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::PanelError;
use crate::services::credential_service::{CredentialForm, Method, Obfs, Protocol};
use crate::utils::{format_bytes_str, format_datetime, format_timestamp};

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub user_name: String,
    pub active_page: &'static str,
    pub email: String,
    pub user_class: i64,
    pub transfer_enable: String,
    pub used_traffic: String,
    pub unused_traffic: String,
    pub usage_percent: i64,
    pub last_check_in: String,
    pub can_checkin: bool,
    pub checkin_hours: i64,
    pub checkin_min: i64,
    pub checkin_max: i64,
}

#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub user_name: String,
    pub active_page: &'static str,
    pub user: User,
    pub created_at: String,
}

pub struct SelectOption {
    pub value: &'static str,
    pub selected: bool,
}

fn options(values: impl Iterator<Item = &'static str>, current: &str) -> Vec<SelectOption> {
    values
        .map(|value| SelectOption {
            value,
            selected: value == current,
        })
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "edit.html")]
pub struct EditTemplate {
    pub user_name: String,
    pub active_page: &'static str,
    pub sspwd: String,
    pub methods: Vec<SelectOption>,
    pub protocols: Vec<SelectOption>,
    pub obfses: Vec<SelectOption>,
}

pub struct InviteRow {
    pub code: String,
    pub created_at: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "invite.html")]
pub struct InviteTemplate {
    pub user_name: String,
    pub active_page: &'static str,
    pub invite_num: i64,
    pub codes: Vec<InviteRow>,
}

pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> impl IntoResponse {
    let policy = state.checkin_service.policy();
    let usage_percent = if user.transfer_enable > 0 {
        (user.used_traffic() * 100 / user.transfer_enable).clamp(0, 100)
    } else {
        0
    };

    IndexTemplate {
        active_page: "index",
        email: user.email.clone(),
        user_class: user.user_class,
        transfer_enable: format_bytes_str(user.transfer_enable),
        used_traffic: format_bytes_str(user.used_traffic()),
        unused_traffic: format_bytes_str(user.unused_traffic()),
        usage_percent,
        last_check_in: format_timestamp(user.last_check_in_time),
        can_checkin: user.is_able_to_checkin(Utc::now(), policy.interval),
        checkin_hours: policy.interval.num_hours(),
        checkin_min: policy.min_mb,
        checkin_max: policy.max_mb,
        user_name: user.user_name,
    }
}

pub async fn profile(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    ProfileTemplate {
        user_name: user.user_name.clone(),
        active_page: "profile",
        created_at: format_datetime(&user.created_at),
        user,
    }
}

pub async fn edit(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    EditTemplate {
        active_page: "edit",
        methods: options(Method::ALL.iter().map(|m| m.as_str()), &user.method),
        protocols: options(Protocol::ALL.iter().map(|p| p.as_str()), &user.protocol),
        obfses: options(Obfs::ALL.iter().map(|o| o.as_str()), &user.obfs),
        sspwd: user.passwd,
        user_name: user.user_name,
    }
}

pub async fn invite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, PanelError> {
    let codes = state
        .invites
        .get_for_user(user.id)
        .await?
        .into_iter()
        .map(|c| InviteRow {
            created_at: format_datetime(&c.created_at),
            code: c.code,
        })
        .collect();

    Ok(InviteTemplate {
        user_name: user.user_name,
        active_page: "invite",
        invite_num: user.invite_num,
        codes,
    })
}

pub async fn checkin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, PanelError> {
    let reward = state.checkin_service.checkin(&user).await?;
    Ok(Json(json!({ "msg": reward.message() })))
}

pub async fn ssr_edit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    form: Result<Form<CredentialForm>, FormRejection>,
) -> Result<Json<Value>, PanelError> {
    let Form(form) = form?;
    state.credential_service.apply(user.id, &form).await?;
    Ok(Json(json!({})))
}
