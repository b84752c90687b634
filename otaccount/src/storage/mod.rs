mod data_store;
mod errors;
mod schema_validation;
mod template;
mod types;

pub use data_store::{DataStoreConfig, PostgresDataStore, SqliteDataStore, StoreType};
pub use errors::StorageError;
pub use types::{
    Connection, DatabaseAccess, Dialect, Params, QueryOutcome, Row, Statement, StatementKind,
    Value, WriteResult,
};

pub(crate) use schema_validation::validate_table_schema;

/// Run one statement as a single unit of work.
///
/// The connection is released before returning, whether or not the
/// statement succeeded.
pub async fn run(
    db: &dyn DatabaseAccess,
    statement: &Statement,
) -> Result<QueryOutcome, StorageError> {
    let mut conn = db.acquire().await?;
    let result = conn.query(statement).await;
    conn.release();
    result
}
