// handlers/protected/password.rs - GET/POST /password handlers

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tower_cookies::Cookies;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::middleware::{clear_cookie, CurrentAdmin};
use crate::state::AppState;
use crate::views::View;

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// GET /password - Show the change-password form
pub async fn password_get(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<CurrentAdmin>,
) -> Result<Response, ApiError> {
    password_page(&state, &admin, None)
}

/// POST /password - Change the signed-in admin's password
///
/// On success the current session is revoked and the admin has to log in
/// again with the new password.
pub async fn password_post(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<CurrentAdmin>,
    cookies: Cookies,
    Form(form): Form<PasswordForm>,
) -> Result<Response, ApiError> {
    let Some(user) = state.users.find_by_id(admin.id).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    if !verify_password(&form.old_password, &user.password) {
        warn!("Wrong current password for user '{}'", user.username);
        return password_page(&state, &admin, Some("old_password_error"));
    }
    if form.new_password.is_empty() || form.new_password != form.confirm_password {
        return password_page(&state, &admin, Some("new_password_different"));
    }

    state
        .users
        .set_password(user.id, &hash_password(&form.new_password))
        .await?;
    state.sessions.revoke(&admin.token).await?;
    clear_cookie(&cookies, &state.config.auth.cookie_name);

    info!("Password changed for user '{}'", user.username);
    Ok(Redirect::to("/login").into_response())
}

fn password_page(state: &AppState, admin: &CurrentAdmin, error: Option<&str>) -> Result<Response, ApiError> {
    let view = View::Password {
        layout: state.layout("Change password", Some(admin)),
        error: error.map(str::to_string),
    };
    Ok(state.render(&view)?.into_response())
}
