// handlers/protected/datatable.rs - POST /dt/:entity handler

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap},
    response::Json,
};

use crate::datatable::{build_page, DtRequest, DtResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /dt/:entity - DataTables server-side processing
///
/// Accepts the form-encoded body DataTables posts by default, or the same
/// parameters as JSON. Responds with `draw`, `recordsTotal`,
/// `recordsFiltered` and rendered `data` rows.
pub async fn datatable(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DtResponse>, ApiError> {
    let entity = state.registry.entity(&name)?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let request = DtRequest::parse(content_type, &body)?;

    let page = build_page(
        &state.registry,
        state.store.as_ref(),
        entity,
        &request,
        state.config.admin.datatable_max_length,
    )
    .await?;

    tracing::debug!(
        "Datatable {} draw={} start={} rows={}",
        entity.name,
        page.draw,
        request.start,
        page.data.len()
    );
    Ok(Json(page))
}
