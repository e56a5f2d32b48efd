use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::{cookie::SameSite, Cookie, Cookies};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// The signed-in admin, inserted into request extensions by [`require_admin`]
#[derive(Clone, Debug)]
pub struct CurrentAdmin {
    pub id: i64,
    pub username: String,
    pub token: String,
}

/// Resolve the session cookie to an admin that still exists
pub async fn current_admin(state: &AppState, cookies: &Cookies) -> Result<Option<CurrentAdmin>, ApiError> {
    let Some(token) = cookies
        .get(&state.config.auth.cookie_name)
        .map(|c| c.value().to_string())
    else {
        return Ok(None);
    };

    let Some(user_id) = state.sessions.resolve(&token).await? else {
        debug!("Session token did not resolve");
        return Ok(None);
    };

    match state.users.find_by_id(user_id).await? {
        Some(user) => Ok(Some(CurrentAdmin {
            id: user.id,
            username: user.username,
            token,
        })),
        None => {
            debug!("Session refers to missing user {}", user_id);
            Ok(None)
        }
    }
}

/// Gate for admin pages: `303 See Other` to `/login` without a valid session
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    match current_admin(&state, &cookies).await {
        Ok(Some(admin)) => {
            request.extensions_mut().insert(admin);
            next.run(request).await
        }
        Ok(None) => Redirect::to("/login").into_response(),
        Err(e) => e.into_response(),
    }
}

/// Session cookie carrying `token` for `ttl`
pub fn session_cookie(state: &AppState, token: String, ttl: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(state.config.auth.cookie_name.clone(), token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(state.config.security.secure_cookies);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(tower_cookies::cookie::time::Duration::seconds(ttl.as_secs() as i64));
    cookie
}

/// Short-lived cookie the login page reads once
pub fn flash_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// Expire a cookie previously set with path `/`
pub fn clear_cookie(cookies: &Cookies, name: &str) {
    let mut cookie = Cookie::new(name.to_string(), "");
    cookie.set_path("/");
    cookies.remove(cookie);
}
