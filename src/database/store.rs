use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::manager::DatabaseError;
use crate::entity::{Entity, EntityRegistry};
use crate::form::OptionsProvider;

/// One entity row as a JSON object keyed by column name
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC NULLS FIRST",
            SortDirection::Desc => "DESC NULLS LAST",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SortColumn {
    Field(String),
    /// Sort a reference column by the label of the row it points at
    ReferenceLabel { column: String, target: Arc<Entity> },
}

#[derive(Debug, Clone)]
pub struct SortKey {
    pub column: SortColumn,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    pub offset: usize,
    pub limit: usize,
    pub order: Vec<SortKey>,
}

/// A row of a reverse relation, grouped by the id it points back at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedRow {
    pub owner: i64,
    pub id: i64,
    pub label: String,
}

/// Read access to entity tables
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn health(&self) -> Result<(), DatabaseError>;

    /// Rows in `query.order`, ties broken by ascending id
    async fn page(&self, entity: &Entity, query: &PageQuery) -> Result<Vec<Row>, DatabaseError>;

    async fn count(&self, entity: &Entity) -> Result<u64, DatabaseError>;

    async fn fetch(&self, entity: &Entity, id: i64) -> Result<Option<Row>, DatabaseError>;

    /// id -> label for the given ids; unknown ids are left out
    async fn labels(&self, entity: &Entity, ids: &[i64]) -> Result<IndexMap<i64, String>, DatabaseError>;

    /// id -> label, ordered by id
    async fn options(
        &self,
        entity: &Entity,
        offset: usize,
        limit: usize,
    ) -> Result<IndexMap<i64, String>, DatabaseError>;

    /// Rows of `target` whose `column` holds one of `owner_ids`
    async fn related(
        &self,
        target: &Entity,
        column: &str,
        owner_ids: &[i64],
    ) -> Result<Vec<RelatedRow>, DatabaseError>;
}

/// An account allowed into the admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    /// Stored password hash
    #[serde(skip_serializing)]
    pub password: String,
}

/// Storage of admin accounts. Passwords arrive already hashed.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<AdminUser>, DatabaseError>;

    async fn any_exists(&self) -> Result<bool, DatabaseError>;

    async fn create(&self, username: &str, password_hash: &str) -> Result<AdminUser, DatabaseError>;

    async fn set_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError>;
}

/// Reference options for form schemas, read through the entity store
pub struct StoreOptions {
    registry: Arc<EntityRegistry>,
    store: Arc<dyn EntityStore>,
}

impl StoreOptions {
    pub fn new(registry: Arc<EntityRegistry>, store: Arc<dyn EntityStore>) -> Self {
        Self { registry, store }
    }
}

#[async_trait]
impl OptionsProvider for StoreOptions {
    async fn reference_options(
        &self,
        entity: &str,
        offset: usize,
        limit: usize,
    ) -> anyhow::Result<IndexMap<i64, String>> {
        let entity = self.registry.entity(entity)?;
        Ok(self.store.options(entity, offset, limit).await?)
    }
}

/// Integer id of a row, if it has one
pub fn row_id(row: &Row) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

/// Text shown for a row's label column
pub fn label_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
