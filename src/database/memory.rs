use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::store::{
    label_text, row_id, AdminUser, EntityStore, PageQuery, RelatedRow, Row, SortColumn,
    SortDirection, UserStore,
};
use crate::entity::Entity;

/// Entity rows held in memory, keyed by entity name
#[derive(Default)]
pub struct MemoryEntityStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row. It must be an object with an integer `id` not yet present.
    pub async fn insert(&self, entity: &str, row: Value) -> Result<(), DatabaseError> {
        let Value::Object(row) = row else {
            return Err(DatabaseError::QueryError(format!(
                "{} row must be a JSON object",
                entity
            )));
        };
        let id = row_id(&row).ok_or_else(|| {
            DatabaseError::QueryError(format!("{} row has no integer id", entity))
        })?;

        let mut tables = self.tables.write().await;
        let rows = tables.entry(entity.to_string()).or_default();
        if rows.iter().any(|r| row_id(r) == Some(id)) {
            return Err(DatabaseError::Conflict(format!("{} {} already exists", entity, id)));
        }
        rows.push(row);
        Ok(())
    }

    /// Load `{ "Entity": [row, ...], ... }`, returning the number of rows added
    pub async fn seed(&self, data: Value) -> Result<usize, DatabaseError> {
        let Value::Object(tables) = data else {
            return Err(DatabaseError::QueryError(
                "seed data must map entity names to rows".to_string(),
            ));
        };
        let mut added = 0;
        for (entity, rows) in tables {
            let Value::Array(rows) = rows else {
                return Err(DatabaseError::QueryError(format!(
                    "seed rows for {} must be an array",
                    entity
                )));
            };
            for row in rows {
                self.insert(&entity, row).await?;
                added += 1;
            }
        }
        Ok(added)
    }

    async fn rows(&self, entity: &str) -> Vec<Row> {
        self.tables
            .read()
            .await
            .get(entity)
            .cloned()
            .unwrap_or_default()
    }

    async fn label_map(&self, entity: &Entity) -> HashMap<i64, String> {
        self.rows(&entity.name)
            .await
            .iter()
            .filter_map(|row| row_id(row).map(|id| (id, label_text(row.get(&entity.label)))))
            .collect()
    }
}

/// Null sorts first, then booleans, numbers, strings and everything else
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn health(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn page(&self, entity: &Entity, query: &PageQuery) -> Result<Vec<Row>, DatabaseError> {
        let mut rows = self.rows(&entity.name).await;

        // Resolve reference labels up front so the comparator stays synchronous
        let mut labels: Vec<Option<HashMap<i64, String>>> = Vec::with_capacity(query.order.len());
        for key in &query.order {
            labels.push(match &key.column {
                SortColumn::ReferenceLabel { target, .. } => Some(self.label_map(target).await),
                SortColumn::Field(_) => None,
            });
        }

        rows.sort_by(|a, b| {
            for (key, labels) in query.order.iter().zip(&labels) {
                let ordering = match (&key.column, labels) {
                    (SortColumn::ReferenceLabel { column, .. }, Some(labels)) => {
                        let label = |row: &Row| {
                            row.get(column)
                                .and_then(Value::as_i64)
                                .and_then(|id| labels.get(&id))
                                .map(|l| Value::String(l.clone()))
                        };
                        compare_values(label(a).as_ref(), label(b).as_ref())
                    }
                    (SortColumn::Field(field), _) | (SortColumn::ReferenceLabel { column: field, .. }, None) => {
                        compare_values(a.get(field), b.get(field))
                    }
                };
                let ordering = match key.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            row_id(a).cmp(&row_id(b))
        });

        Ok(rows.into_iter().skip(query.offset).take(query.limit).collect())
    }

    async fn count(&self, entity: &Entity) -> Result<u64, DatabaseError> {
        Ok(self.rows(&entity.name).await.len() as u64)
    }

    async fn fetch(&self, entity: &Entity, id: i64) -> Result<Option<Row>, DatabaseError> {
        Ok(self
            .rows(&entity.name)
            .await
            .into_iter()
            .find(|row| row_id(row) == Some(id)))
    }

    async fn labels(&self, entity: &Entity, ids: &[i64]) -> Result<IndexMap<i64, String>, DatabaseError> {
        let labels = self.label_map(entity).await;
        Ok(ids
            .iter()
            .filter_map(|id| labels.get(id).map(|label| (*id, label.clone())))
            .collect())
    }

    async fn options(
        &self,
        entity: &Entity,
        offset: usize,
        limit: usize,
    ) -> Result<IndexMap<i64, String>, DatabaseError> {
        let mut options: Vec<(i64, String)> = self.label_map(entity).await.into_iter().collect();
        options.sort_by_key(|(id, _)| *id);
        Ok(options.into_iter().skip(offset).take(limit).collect())
    }

    async fn related(
        &self,
        target: &Entity,
        column: &str,
        owner_ids: &[i64],
    ) -> Result<Vec<RelatedRow>, DatabaseError> {
        let mut related: Vec<RelatedRow> = self
            .rows(&target.name)
            .await
            .iter()
            .filter_map(|row| {
                let owner = row.get(column).and_then(Value::as_i64)?;
                if !owner_ids.contains(&owner) {
                    return None;
                }
                Some(RelatedRow {
                    owner,
                    id: row_id(row)?,
                    label: label_text(row.get(&target.label)),
                })
            })
            .collect();
        related.sort_by_key(|r| r.id);
        Ok(related)
    }
}

/// Admin accounts held in memory
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<AdminUser>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, DatabaseError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AdminUser>, DatabaseError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn any_exists(&self) -> Result<bool, DatabaseError> {
        Ok(!self.users.read().await.is_empty())
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<AdminUser, DatabaseError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == username) {
            return Err(DatabaseError::Conflict(format!("user '{}' already exists", username)));
        }
        let user = AdminUser {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            username: username.to_string(),
            password: password_hash.to_string(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn set_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))?;
        user.password = password_hash.to_string();
        Ok(())
    }
}
