// handlers/public/favicon.rs - GET /favicon.ico handler

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};

pub const FAVICON_PATH: &str = "/statics/placeholders/favicon.svg";

/// GET /favicon.ico - Permanent redirect to the bundled icon
pub async fn favicon() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, FAVICON_PATH)])
}
