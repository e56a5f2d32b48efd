// handlers/public/login.rs - GET/POST /login handlers

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_cookies::Cookies;
use tracing::{info, warn};

use crate::auth::verify_password;
use crate::error::ApiError;
use crate::middleware::{clear_cookie, current_admin, flash_cookie, session_cookie};
use crate::state::AppState;
use crate::views::View;

/// Why the last login attempt failed
pub const REASON_COOKIE: &str = "reason";
/// Username of the last failed attempt, refilled into the form
pub const USERNAME_COOKIE: &str = "username";
pub const REMEMBER_COOKIE: &str = "remember_me";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Checkbox; present as `on` when ticked
    pub remember_me: Option<String>,
}

impl LoginForm {
    fn remember(&self) -> bool {
        self.remember_me.as_deref() == Some("on")
    }
}

/// GET /login - Show the login form
///
/// A valid session goes straight back to the dashboard (`307`). The failure
/// cookies left by [`login_post`] are shown once and cleared.
pub async fn login_get(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Response, ApiError> {
    if current_admin(&state, &cookies).await?.is_some() {
        return Ok(Redirect::temporary("/").into_response());
    }

    let take = |name: &str| {
        let value = cookies.get(name).map(|c| c.value().to_string());
        if value.is_some() {
            clear_cookie(&cookies, name);
        }
        value
    };
    let reason = take(REASON_COOKIE);
    let username = take(USERNAME_COOKIE);

    let view = View::Login {
        layout: state.layout("Login", None),
        reason,
        username,
    };
    Ok(state.render(&view)?.into_response())
}

/// POST /login - Check credentials and start a session
///
/// Form fields: `username`, `password`, `remember_me=on`. Success sets the
/// session cookie (1 hour, or 30 days with remember_me) and redirects to `/`.
/// Failure redirects to `/login` with `reason` and `username` cookies.
pub async fn login_post(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let user = match state.users.find_by_username(&form.username).await? {
        Some(user) => user,
        None => {
            warn!("Login attempt for unknown user '{}'", form.username);
            return Ok(login_failed(&cookies, "username", &form.username));
        }
    };

    if !verify_password(&form.password, &user.password) {
        warn!("Wrong password for user '{}'", form.username);
        return Ok(login_failed(&cookies, "password", &form.username));
    }

    let remember = form.remember();
    let ttl = state.session_ttl(remember);
    let token = state.sessions.issue(&user, ttl).await?;
    cookies.add(session_cookie(&state, token, ttl));
    if remember {
        let mut cookie = flash_cookie(REMEMBER_COOKIE, "on".to_string());
        cookie.set_max_age(tower_cookies::cookie::time::Duration::seconds(ttl.as_secs() as i64));
        cookies.add(cookie);
    } else if cookies.get(REMEMBER_COOKIE).is_some() {
        clear_cookie(&cookies, REMEMBER_COOKIE);
    }

    info!("User '{}' logged in", user.username);
    Ok(Redirect::to("/").into_response())
}

fn login_failed(cookies: &Cookies, reason: &str, username: &str) -> Response {
    cookies.add(flash_cookie(REASON_COOKIE, reason.to_string()));
    cookies.add(flash_cookie(USERNAME_COOKIE, username.to_string()));
    Redirect::to("/login").into_response()
}
