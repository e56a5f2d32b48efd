// handlers/protected/dashboard.rs - GET / handler

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension,
};

use crate::error::ApiError;
use crate::middleware::CurrentAdmin;
use crate::state::AppState;
use crate::views::{NavEntry, View};

/// GET / - Row counts for every registered entity
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<CurrentAdmin>,
) -> Result<Response, ApiError> {
    let mut counts = Vec::with_capacity(state.registry.len());
    for entity in state.registry.iter() {
        let count = state.store.count(entity).await?;
        counts.push((
            NavEntry {
                name: entity.name.clone(),
                title: entity.title.clone(),
            },
            count,
        ));
    }

    let view = View::Dashboard {
        layout: state.layout("Dashboard", Some(&admin)),
        counts,
    };
    Ok(state.render(&view)?.into_response())
}
