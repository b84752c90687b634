use super::errors::StorageError;
use super::run;
use super::types::{DatabaseAccess, Dialect, QueryOutcome, Statement, Value};

/// Validates that a database table schema matches what we expect
pub async fn validate_table_schema<E>(
    db: &dyn DatabaseAccess,
    table_name: &str,
    expected_columns: &[(&str, &str)],
    error_mapper: impl Fn(String) -> E,
) -> Result<(), E>
where
    E: From<StorageError>,
{
    let template = match db.dialect() {
        Dialect::Sqlite => {
            "SELECT name AS column_name, type AS data_type FROM pragma_table_info(:table)"
        }
        Dialect::Postgres => {
            "SELECT column_name::text AS column_name, data_type::text AS data_type \
             FROM information_schema.columns WHERE table_name = :table ORDER BY column_name"
        }
    };

    let rows = run(db, &Statement::fetch(template).bind("table", table_name))
        .await
        .and_then(QueryOutcome::into_rows)?;

    if rows.is_empty() {
        return Err(error_mapper(format!(
            "Schema validation failed: Table '{table_name}' does not exist"
        )));
    }

    let actual_columns: Vec<(String, String)> = rows
        .iter()
        .filter_map(|row| match (row.get("column_name"), row.get("data_type")) {
            (Some(Value::Text(name)), Some(Value::Text(type_))) => {
                Some((name.clone(), type_.clone()))
            }
            _ => None,
        })
        .collect();

    for (expected_name, expected_type) in expected_columns {
        let found = actual_columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(expected_name));

        match found {
            Some((_, actual_type)) if actual_type.eq_ignore_ascii_case(expected_type) => {}
            Some((_, actual_type)) => {
                return Err(error_mapper(format!(
                    "Schema validation failed: Column '{expected_name}' has type '{actual_type}' but expected '{expected_type}'"
                )));
            }
            None => {
                return Err(error_mapper(format!(
                    "Schema validation failed: Missing column '{expected_name}'"
                )));
            }
        }
    }

    for (actual_name, _) in &actual_columns {
        if !expected_columns
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(actual_name))
        {
            tracing::warn!(
                column = %actual_name,
                table = %table_name,
                "Extra column found in table"
            );
        }
    }

    Ok(())
}
