// handlers/protected/entity.rs - GET /:entity and GET /:entity/:id handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension,
};
use indexmap::IndexMap;
use serde_json::Value;

use crate::entity::FieldLink;
use crate::error::ApiError;
use crate::middleware::CurrentAdmin;
use crate::state::AppState;
use crate::views::{Column, View};

/// GET /:entity - Datatable page listing an entity's rows
///
/// Columns follow the derived schema's field order, which is also what the
/// datatable endpoint indexes `order[i][column]` against.
pub async fn entity_index(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<CurrentAdmin>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let entity = state.registry.entity(&name)?;

    let columns = entity
        .schema
        .iter()
        .map(|(field, descriptor)| Column {
            field: field.clone(),
            title: descriptor.display_name.clone(),
            orderable: !matches!(entity.link(field), Some(FieldLink::Reverse { .. })),
        })
        .collect();

    let view = View::Index {
        layout: state.layout(&entity.title, Some(&admin)),
        entity: entity.name.clone(),
        columns,
    };
    Ok(state.render(&view)?.into_response())
}

/// GET /:entity/:id - Form view of a single row
///
/// Reference options are loaded up to `admin.reference_options_limit`; the
/// currently referenced row is always among them even past that limit.
pub async fn entity_edit(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<CurrentAdmin>,
    Path((name, id)): Path<(String, i64)>,
) -> Result<Response, ApiError> {
    let entity = state.registry.entity(&name)?;
    let Some(row) = state.store.fetch(entity, id).await? else {
        return Err(ApiError::not_found(format!("{} {} not found", entity.name, id)));
    };

    let mut schema = entity
        .schema
        .materialize(&state.options(), state.config.admin.reference_options_limit)
        .await;

    let mut values = IndexMap::with_capacity(schema.len());
    for (field, descriptor) in schema.fields.iter_mut() {
        let value = match entity.link(field) {
            Some(FieldLink::Reverse { target, column }) => {
                let target = state.registry.entity(target)?;
                let related = state.store.related(target, column, &[id]).await?;
                for r in &related {
                    descriptor.options.entry(r.id).or_insert_with(|| r.label.clone());
                }
                Value::Array(related.iter().map(|r| Value::from(r.id)).collect())
            }
            Some(FieldLink::Reference { target }) => {
                let value = row.get(field).cloned().unwrap_or(Value::Null);
                if let (Some(current), Some(target)) = (value.as_i64(), state.registry.get(target)) {
                    if !descriptor.options.contains_key(&current) {
                        let labels = state.store.labels(target, &[current]).await?;
                        descriptor.options.extend(labels);
                    }
                }
                value
            }
            None => row.get(field).cloned().unwrap_or(Value::Null),
        };
        values.insert(field.clone(), value);
    }

    let view = View::Edit {
        layout: state.layout(&entity.title, Some(&admin)),
        entity: entity.name.clone(),
        id,
        schema,
        values,
    };
    Ok(state.render(&view)?.into_response())
}
