use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use super::manager::{quote_identifier, DatabaseError};
use super::store::{
    AdminUser, EntityStore, PageQuery, RelatedRow, Row, SortColumn, UserStore,
};
use crate::entity::Entity;

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Entity tables read through sqlx, rows fetched as `row_to_json`
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn page_sql(entity: &Entity, query: &PageQuery) -> Result<String, DatabaseError> {
        let mut joins = String::new();
        let mut order = Vec::with_capacity(query.order.len() + 1);

        for (index, key) in query.order.iter().enumerate() {
            let direction = key.direction.as_sql();
            match &key.column {
                SortColumn::Field(field) => {
                    order.push(format!("base.{} {}", quote_identifier(field)?, direction));
                }
                SortColumn::ReferenceLabel { column, target } => {
                    let alias = format!("j{}", index);
                    joins.push_str(&format!(
                        " LEFT JOIN {table} {alias} ON {alias}.\"id\" = base.{column}",
                        table = quote_identifier(&target.table)?,
                        alias = alias,
                        column = quote_identifier(column)?,
                    ));
                    order.push(format!(
                        "{}.{} {}",
                        alias,
                        quote_identifier(&target.label)?,
                        direction
                    ));
                }
            }
        }
        order.push("base.\"id\" ASC".to_string());

        Ok(format!(
            "SELECT row_to_json(base) FROM {} base{} ORDER BY {} LIMIT $1 OFFSET $2",
            quote_identifier(&entity.table)?,
            joins,
            order.join(", ")
        ))
    }
}

/// Postgres has no unsigned integers
fn bind_i64(name: &str, value: usize) -> Result<i64, DatabaseError> {
    i64::try_from(value).map_err(|_| DatabaseError::OutOfRange(format!("{} {}", name, value)))
}

fn into_rows(values: Vec<Value>) -> Vec<Row> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn health(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn page(&self, entity: &Entity, query: &PageQuery) -> Result<Vec<Row>, DatabaseError> {
        let sql = Self::page_sql(entity, query)?;
        debug!("page {}: {}", entity.name, sql);

        let values: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(bind_i64("length", query.limit)?)
            .bind(bind_i64("start", query.offset)?)
            .fetch_all(&self.pool)
            .await?;
        Ok(into_rows(values))
    }

    async fn count(&self, entity: &Entity) -> Result<u64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(&entity.table)?);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn fetch(&self, entity: &Entity, id: i64) -> Result<Option<Row>, DatabaseError> {
        let sql = format!(
            "SELECT row_to_json(base) FROM {} base WHERE base.\"id\" = $1",
            quote_identifier(&entity.table)?
        );
        let value: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.and_then(|v| into_rows(vec![v]).pop()))
    }

    async fn labels(&self, entity: &Entity, ids: &[i64]) -> Result<IndexMap<i64, String>, DatabaseError> {
        if ids.is_empty() {
            return Ok(IndexMap::new());
        }
        let sql = format!(
            "SELECT \"id\"::int8, {}::text FROM {} WHERE \"id\" = ANY($1)",
            quote_identifier(&entity.label)?,
            quote_identifier(&entity.table)?
        );
        let rows: Vec<(i64, Option<String>)> = sqlx::query_as(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, label)| (id, label.unwrap_or_default()))
            .collect())
    }

    async fn options(
        &self,
        entity: &Entity,
        offset: usize,
        limit: usize,
    ) -> Result<IndexMap<i64, String>, DatabaseError> {
        let sql = format!(
            "SELECT \"id\"::int8, {}::text FROM {} ORDER BY \"id\" LIMIT $1 OFFSET $2",
            quote_identifier(&entity.label)?,
            quote_identifier(&entity.table)?
        );
        let rows: Vec<(i64, Option<String>)> = sqlx::query_as(&sql)
            .bind(bind_i64("limit", limit)?)
            .bind(bind_i64("offset", offset)?)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, label)| (id, label.unwrap_or_default()))
            .collect())
    }

    async fn related(
        &self,
        target: &Entity,
        column: &str,
        owner_ids: &[i64],
    ) -> Result<Vec<RelatedRow>, DatabaseError> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }
        let column = quote_identifier(column)?;
        let sql = format!(
            "SELECT {column}::int8, \"id\"::int8, {label}::text FROM {table} \
             WHERE {column} = ANY($1) ORDER BY \"id\"",
            column = column,
            label = quote_identifier(&target.label)?,
            table = quote_identifier(&target.table)?,
        );
        let rows: Vec<(i64, i64, Option<String>)> = sqlx::query_as(&sql)
            .bind(owner_ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(owner, id, label)| RelatedRow {
                owner,
                id,
                label: label.unwrap_or_default(),
            })
            .collect())
    }
}

/// Admin accounts in a table with `id`, `username` and `password` columns
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    table: String,
}

impl PgUserStore {
    pub fn new(pool: PgPool, table: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            pool,
            table: quote_identifier(table)?,
        })
    }

    async fn find_one(&self, column: &str, bind: UserKey<'_>) -> Result<Option<AdminUser>, DatabaseError> {
        let sql = format!(
            "SELECT \"id\"::int8, \"username\", \"password\" FROM {} WHERE \"{}\" = $1",
            self.table, column
        );
        let query = sqlx::query_as::<_, (i64, String, String)>(&sql);
        let row = match bind {
            UserKey::Id(id) => query.bind(id).fetch_optional(&self.pool).await?,
            UserKey::Username(name) => query.bind(name).fetch_optional(&self.pool).await?,
        };
        Ok(row.map(|(id, username, password)| AdminUser {
            id,
            username,
            password,
        }))
    }
}

enum UserKey<'a> {
    Id(i64),
    Username(&'a str),
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, DatabaseError> {
        self.find_one("username", UserKey::Username(username)).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AdminUser>, DatabaseError> {
        self.find_one("id", UserKey::Id(id)).await
    }

    async fn any_exists(&self) -> Result<bool, DatabaseError> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {})", self.table);
        Ok(sqlx::query_scalar(&sql).fetch_one(&self.pool).await?)
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<AdminUser, DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (\"username\", \"password\") VALUES ($1, $2) RETURNING \"id\"::int8",
            self.table
        );
        let id: i64 = sqlx::query_scalar(&sql)
            .bind(username)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                    DatabaseError::Conflict(format!("user '{}' already exists", username))
                }
                _ => DatabaseError::Sqlx(e),
            })?;
        Ok(AdminUser {
            id,
            username: username.to_string(),
            password: password_hash.to_string(),
        })
    }

    async fn set_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError> {
        let sql = format!("UPDATE {} SET \"password\" = $1 WHERE \"id\" = $2", self.table);
        let result = sqlx::query(&sql)
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }
}
