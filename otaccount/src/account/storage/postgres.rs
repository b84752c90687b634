use crate::account::errors::AccountError;
use crate::storage::{DatabaseAccess, Statement, StorageError, run, validate_table_schema};

// PostgreSQL implementations
pub(super) async fn create_tables_postgres(
    db: &dyn DatabaseAccess,
    table_name: &str,
) -> Result<(), AccountError> {
    run(
        db,
        &Statement::execute(format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{table_name}" (
                "id" BIGSERIAL PRIMARY KEY,
                "name" TEXT NOT NULL UNIQUE,
                "password" TEXT NOT NULL,
                "type" BIGINT NOT NULL DEFAULT 1,
                "premdays" BIGINT NOT NULL DEFAULT 0,
                "lastday" BIGINT NOT NULL DEFAULT 0,
                "email" TEXT NOT NULL DEFAULT '',
                "creation" BIGINT NOT NULL DEFAULT 0
            )
            "#
        )),
    )
    .await?;

    Ok(())
}

/// Validates that the accounts table schema matches what we expect
pub(super) async fn validate_account_tables_postgres(
    db: &dyn DatabaseAccess,
    table_name: &str,
) -> Result<(), AccountError> {
    let expected_columns = vec![
        ("id", "bigint"),
        ("name", "text"),
        ("password", "text"),
        ("type", "bigint"),
        ("premdays", "bigint"),
        ("lastday", "bigint"),
        ("email", "text"),
        ("creation", "bigint"),
    ];

    validate_table_schema(db, table_name, &expected_columns, |msg| {
        AccountError::Storage(StorageError::Schema(msg))
    })
    .await
}
