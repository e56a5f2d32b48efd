//! DataTables server-side processing over entity stores.

pub mod render;
pub mod request;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::database::{row_id, DatabaseError, EntityStore, PageQuery, SortColumn, SortKey};
use crate::entity::{Entity, EntityRegistry, FieldLink};

pub use render::{badge, render_row, truncate, PageContext, MAX_TEXT_CHARS};
pub use request::{DtOrder, DtRequest};

#[derive(Debug, Error)]
pub enum DatatableError {
    #[error("Malformed datatable request: {0}")]
    Malformed(String),

    #[error("Missing datatable parameter: {0}")]
    MissingField(&'static str),

    #[error("Invalid number for {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Column {0} is out of range")]
    ColumnOutOfRange(usize),

    #[error("Column '{0}' is not sortable")]
    NotSortable(String),

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DtResponse {
    pub draw: i64,
    pub records_total: u64,
    pub records_filtered: u64,
    pub data: Vec<Map<String, Value>>,
}

/// Map DataTables column positions onto sort keys over the schema fields
pub fn sort_keys(
    registry: &EntityRegistry,
    entity: &Entity,
    order: &[DtOrder],
) -> Result<Vec<SortKey>, DatatableError> {
    order
        .iter()
        .map(|o| {
            let (name, _) = entity
                .schema
                .field_at(o.column)
                .ok_or(DatatableError::ColumnOutOfRange(o.column))?;
            let column = match entity.link(name) {
                Some(FieldLink::Reverse { .. }) => {
                    return Err(DatatableError::NotSortable(name.clone()))
                }
                Some(FieldLink::Reference { target }) => match registry.get(target) {
                    Some(target) => SortColumn::ReferenceLabel {
                        column: name.clone(),
                        target: Arc::clone(target),
                    },
                    None => SortColumn::Field(name.clone()),
                },
                None => SortColumn::Field(name.clone()),
            };
            Ok(SortKey {
                column,
                direction: o.dir,
            })
        })
        .collect()
}

/// Fetch, resolve and render one page of an entity's rows
pub async fn build_page(
    registry: &EntityRegistry,
    store: &dyn EntityStore,
    entity: &Entity,
    request: &DtRequest,
    max_length: usize,
) -> Result<DtResponse, DatatableError> {
    let limit = request.limit(max_length);
    let query = PageQuery {
        offset: request.start,
        limit,
        order: sort_keys(registry, entity, &request.order)?,
    };
    let rows = store.page(entity, &query).await?;

    let mut context = PageContext::default();
    let owner_ids: Vec<i64> = rows.iter().filter_map(row_id).collect();
    for name in entity.schema.fields.keys() {
        match entity.link(name) {
            Some(FieldLink::Reference { target }) => {
                let Some(target) = registry.get(target) else {
                    continue;
                };
                let mut ids: Vec<i64> = rows
                    .iter()
                    .filter_map(|row| row.get(name).and_then(Value::as_i64))
                    .collect();
                ids.sort_unstable();
                ids.dedup();
                let labels = store.labels(target, &ids).await?;
                context.labels.insert(name.clone(), labels);
            }
            Some(FieldLink::Reverse { target, column }) => {
                let Some(target) = registry.get(target) else {
                    continue;
                };
                let mut by_owner: HashMap<i64, Vec<_>> = HashMap::new();
                for related in store.related(target, column, &owner_ids).await? {
                    by_owner.entry(related.owner).or_default().push(related);
                }
                context.related.insert(name.clone(), by_owner);
            }
            None => {}
        }
    }

    let data: Vec<Map<String, Value>> = rows
        .iter()
        .map(|row| render_row(entity, row, &context))
        .collect();

    let total = if data.len() < limit {
        (request.start + data.len()) as u64
    } else {
        store.count(entity).await?
    };

    Ok(DtResponse {
        draw: request.draw,
        records_total: total,
        records_filtered: total,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryEntityStore, SortDirection};
    use crate::entity::RegistryOptions;
    use serde_json::json;

    const ENTITIES: &str = "entities:\n  - name: User\n    label: username\n    fields:\n      - { name: id, type: int }\n      - { name: username, type: str }\n      - { name: posts, type: rev(Post.user_id) }\n  - name: Post\n    label: text\n    fields:\n      - { name: id, type: int }\n      - { name: text, type: str }\n      - { name: user_id, type: int }\n";

    async fn fixture() -> (EntityRegistry, MemoryEntityStore) {
        let registry = EntityRegistry::from_yaml(ENTITIES, &RegistryOptions::default()).unwrap();
        let store = MemoryEntityStore::new();
        store
            .seed(json!({
                "User": [{ "id": 1, "username": "zed" }, { "id": 2, "username": "amy" }],
                "Post": [
                    { "id": 1, "text": "one", "user_id": 1 },
                    { "id": 2, "text": "two", "user_id": 2 },
                    { "id": 3, "text": "three", "user_id": 1 }
                ]
            }))
            .await
            .unwrap();
        (registry, store)
    }

    fn request(start: usize, length: i64, order: Vec<DtOrder>) -> DtRequest {
        DtRequest {
            draw: 4,
            start,
            length,
            order,
        }
    }

    #[test]
    fn sort_keys_follow_schema_positions() {
        let registry = EntityRegistry::from_yaml(ENTITIES, &RegistryOptions::default()).unwrap();
        let post = registry.entity("Post").unwrap();
        let keys = sort_keys(
            &registry,
            post,
            &[DtOrder { column: 2, dir: SortDirection::Desc }],
        )
        .unwrap();
        assert!(matches!(
            &keys[0].column,
            SortColumn::ReferenceLabel { column, target } if column == "user_id" && target.name == "User"
        ));

        let user = registry.entity("User").unwrap();
        assert!(matches!(
            sort_keys(&registry, user, &[DtOrder { column: 2, dir: SortDirection::Asc }]),
            Err(DatatableError::NotSortable(name)) if name == "posts"
        ));
        assert!(matches!(
            sort_keys(&registry, user, &[DtOrder { column: 9, dir: SortDirection::Asc }]),
            Err(DatatableError::ColumnOutOfRange(9))
        ));
    }

    #[tokio::test]
    async fn short_page_total_is_start_plus_rows() {
        let (registry, store) = fixture().await;
        let post = registry.entity("Post").unwrap();
        let page = build_page(&registry, &store, post, &request(2, 10, vec![]), 100)
            .await
            .unwrap();
        assert_eq!(page.draw, 4);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.records_total, 3);
        assert_eq!(page.records_filtered, 3);
    }

    #[tokio::test]
    async fn full_page_total_is_counted() {
        let (registry, store) = fixture().await;
        let post = registry.entity("Post").unwrap();
        let order = vec![DtOrder { column: 2, dir: SortDirection::Asc }];
        let page = build_page(&registry, &store, post, &request(0, 2, order), 100)
            .await
            .unwrap();
        assert_eq!(page.records_total, 3);
        // amy's post first
        assert!(page.data[0]["id"].as_str().unwrap().contains("/Post/2"));
        assert!(page.data[0]["user_id"].as_str().unwrap().contains(">amy</a>"));
    }

    #[tokio::test]
    async fn reverse_relations_are_resolved() {
        let (registry, store) = fixture().await;
        let user = registry.entity("User").unwrap();
        let page = build_page(&registry, &store, user, &request(0, 10, vec![]), 100)
            .await
            .unwrap();
        let posts = page.data[0]["posts"].as_str().unwrap();
        assert!(posts.contains("href=\"/Post/1\">one</a>"));
        assert!(posts.contains("href=\"/Post/3\">three</a>"));
    }

    #[test]
    fn response_uses_datatables_names() {
        let response = DtResponse {
            draw: 1,
            records_total: 2,
            records_filtered: 2,
            data: vec![],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({ "draw": 1, "recordsTotal": 2, "recordsFiltered": 2, "data": [] })
        );
    }
}
