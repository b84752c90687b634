use crate::account::errors::AccountError;
use crate::storage::{DatabaseAccess, Statement, StorageError, run, validate_table_schema};

// SQLite implementations
pub(super) async fn create_tables_sqlite(
    db: &dyn DatabaseAccess,
    table_name: &str,
) -> Result<(), AccountError> {
    run(
        db,
        &Statement::execute(format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{table_name}" (
                "id" INTEGER PRIMARY KEY AUTOINCREMENT,
                "name" TEXT NOT NULL UNIQUE,
                "password" TEXT NOT NULL,
                "type" INTEGER NOT NULL DEFAULT 1,
                "premdays" INTEGER NOT NULL DEFAULT 0,
                "lastday" INTEGER NOT NULL DEFAULT 0,
                "email" TEXT NOT NULL DEFAULT '',
                "creation" INTEGER NOT NULL DEFAULT 0
            )
            "#
        )),
    )
    .await?;

    Ok(())
}

/// Validates that the accounts table schema matches what we expect
pub(super) async fn validate_account_tables_sqlite(
    db: &dyn DatabaseAccess,
    table_name: &str,
) -> Result<(), AccountError> {
    let expected_columns = vec![
        ("id", "INTEGER"),
        ("name", "TEXT"),
        ("password", "TEXT"),
        ("type", "INTEGER"),
        ("premdays", "INTEGER"),
        ("lastday", "INTEGER"),
        ("email", "TEXT"),
        ("creation", "INTEGER"),
    ];

    validate_table_schema(db, table_name, &expected_columns, |msg| {
        AccountError::Storage(StorageError::Schema(msg))
    })
    .await
}
