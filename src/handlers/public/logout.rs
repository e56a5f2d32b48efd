// handlers/public/logout.rs - GET /logout handler

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use crate::error::ApiError;
use crate::middleware::clear_cookie;
use crate::state::AppState;

/// GET /logout - Revoke the session token, clear the cookie, back to /login
pub async fn logout(State(state): State<Arc<AppState>>, cookies: Cookies) -> Result<Response, ApiError> {
    let name = &state.config.auth.cookie_name;
    if let Some(token) = cookies.get(name).map(|c| c.value().to_string()) {
        state.sessions.revoke(&token).await?;
        clear_cookie(&cookies, name);
    }
    Ok(Redirect::to("/login").into_response())
}
