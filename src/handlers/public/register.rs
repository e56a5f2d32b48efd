// handlers/public/register.rs - GET/POST /reg handlers
//
// First-admin initialisation. Only reachable while the user table is empty;
// afterwards both routes redirect to /login.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_cookies::Cookies;
use tracing::info;

use crate::auth::hash_password;
use crate::error::ApiError;
use crate::middleware::session_cookie;
use crate::state::AppState;
use crate::views::View;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// GET /reg - Show the first-admin form
pub async fn reg_get(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    if state.users.any_exists().await? {
        return Ok(Redirect::to("/login").into_response());
    }
    init_page(&state, None)
}

/// POST /reg - Create the first admin and sign them in
pub async fn reg_post(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<RegisterForm>,
) -> Result<Response, ApiError> {
    if state.users.any_exists().await? {
        return Ok(Redirect::to("/login").into_response());
    }

    let username = form.username.trim();
    if username.is_empty() {
        return init_page(&state, Some("username"));
    }
    if form.password.is_empty() {
        return init_page(&state, Some("password"));
    }
    if form.password != form.confirm_password {
        return init_page(&state, Some("confirm_password_different"));
    }

    let user = state
        .users
        .create(username, &hash_password(&form.password))
        .await?;
    info!("Created first admin '{}'", user.username);

    let ttl = state.session_ttl(false);
    let token = state.sessions.issue(&user, ttl).await?;
    cookies.add(session_cookie(&state, token, ttl));
    Ok(Redirect::to("/").into_response())
}

fn init_page(state: &AppState, error: Option<&str>) -> Result<Response, ApiError> {
    let view = View::Init {
        layout: state.layout("Initialize", None),
        error: error.map(str::to_string),
    };
    Ok(state.render(&view)?.into_response())
}
