// handlers/protected/schema.rs - GET /api/schema/:entity handler

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::form::FormSchema;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SchemaQuery {
    /// Fill reference options from the store
    #[serde(default)]
    pub materialize: bool,
}

/// GET /api/schema/:entity - The derived form schema of an entity
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "entity": "Post",
///     "fields": {
///       "text": { "widget": "text-input", "required": true, "display_name": "Text", ... }
///     }
///   }
/// }
/// ```
pub async fn schema_get(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<SchemaQuery>,
) -> ApiResult<FormSchema> {
    let schema = state.registry.schema(&name)?;
    if query.materialize {
        let limit = state.config.admin.reference_options_limit;
        return Ok(ApiResponse::success(schema.materialize(&state.options(), limit).await));
    }
    Ok(ApiResponse::success(schema.clone()))
}
