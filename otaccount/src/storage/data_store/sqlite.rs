use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

use crate::storage::errors::StorageError;
use crate::storage::template::{RenderedQuery, render};
use crate::storage::types::{
    Connection, DatabaseAccess, Dialect, QueryOutcome, Row, Statement, StatementKind, Value,
    WriteResult,
};

/// SQLite-backed [`DatabaseAccess`]
#[derive(Clone, Debug)]
pub struct SqliteDataStore {
    pool: SqlitePool,
}

impl SqliteDataStore {
    /// Build a lazily connecting pool for `url`.
    ///
    /// In-memory databases live and die with their connection, so they are
    /// pinned to a single pooled connection that never idles out.
    pub fn connect_lazy(url: &str) -> Result<Self, StorageError> {
        if !url.starts_with("sqlite:") {
            return Err(StorageError::Config(format!(
                "SQLite URL must start with 'sqlite:', got '{url}'"
            )));
        }

        let opts = SqliteConnectOptions::from_str(url)
            .map_err(|e| StorageError::Config(format!("Invalid SQLite URL '{url}': {e}")))?
            .create_if_missing(true);

        let pool_options = if is_memory_url(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new()
        };

        tracing::info!(url = %url, "Created SQLite data store");

        Ok(Self {
            pool: pool_options.connect_lazy_with(opts),
        })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[async_trait]
impl DatabaseAccess for SqliteDataStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn acquire(&self) -> Result<Box<dyn Connection>, StorageError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Box::new(SqliteConnection { conn }))
    }
}

struct SqliteConnection {
    conn: PoolConnection<Sqlite>,
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn query(&mut self, statement: &Statement) -> Result<QueryOutcome, StorageError> {
        let RenderedQuery { sql, values } =
            render(&statement.template, &statement.params, Dialect::Sqlite)?;
        tracing::debug!(sql = %sql, params = values.len(), "Executing SQLite statement");

        let mut query = sqlx::query(&sql);
        for value in values {
            query = match value {
                Value::Null => query.bind(None::<i64>),
                Value::Int(v) => query.bind(v),
                Value::Text(v) => query.bind(v),
            };
        }

        match &statement.kind {
            StatementKind::Fetch => {
                let rows = query.fetch_all(&mut *self.conn).await?;
                rows.iter()
                    .map(decode_row)
                    .collect::<Result<Vec<_>, _>>()
                    .map(QueryOutcome::Rows)
            }
            StatementKind::Execute => {
                let result = query.execute(&mut *self.conn).await?;
                Ok(QueryOutcome::Write(WriteResult {
                    rows_affected: result.rows_affected(),
                    insert_id: None,
                }))
            }
            StatementKind::ExecuteReturning(column) => {
                let row = query.fetch_optional(&mut *self.conn).await?;
                let insert_id = row
                    .map(|r| r.try_get::<i64, _>(column.as_str()))
                    .transpose()?;
                Ok(QueryOutcome::Write(WriteResult {
                    rows_affected: u64::from(insert_id.is_some()),
                    insert_id,
                }))
            }
        }
    }

    fn release(self: Box<Self>) {
        // Dropping a PoolConnection hands it back to the pool.
        drop(self.conn);
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row, StorageError> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
            Value::from(v)
        } else {
            Value::from(row.try_get::<Option<String>, _>(index)?)
        };
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}
