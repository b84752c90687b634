use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Postgres, Row as _, TypeInfo};

use crate::storage::errors::StorageError;
use crate::storage::template::{RenderedQuery, render};
use crate::storage::types::{
    Connection, DatabaseAccess, Dialect, QueryOutcome, Row, Statement, StatementKind, Value,
    WriteResult,
};

/// PostgreSQL-backed [`DatabaseAccess`]
#[derive(Clone, Debug)]
pub struct PostgresDataStore {
    pool: PgPool,
}

impl PostgresDataStore {
    pub fn connect_lazy(url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .connect_lazy(url)
            .map_err(|e| StorageError::Config(format!("Invalid Postgres URL: {e}")))?;

        tracing::info!("Created Postgres data store");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseAccess for PostgresDataStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn acquire(&self) -> Result<Box<dyn Connection>, StorageError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Box::new(PostgresConnection { conn }))
    }
}

struct PostgresConnection {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn query(&mut self, statement: &Statement) -> Result<QueryOutcome, StorageError> {
        let RenderedQuery { sql, values } =
            render(&statement.template, &statement.params, Dialect::Postgres)?;
        tracing::debug!(sql = %sql, params = values.len(), "Executing Postgres statement");

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
        drop(self.conn);
    }
}

fn decode_row(row: &PgRow) -> Result<Row, StorageError> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value = match column.type_info().name() {
            "INT8" => Value::from(row.try_get::<Option<i64>, _>(index)?),
            "INT4" => Value::from(row.try_get::<Option<i32>, _>(index)?.map(i64::from)),
            "INT2" => Value::from(row.try_get::<Option<i16>, _>(index)?.map(i64::from)),
            _ => Value::from(row.try_get::<Option<String>, _>(index)?),
        };
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}
