use crate::account::{Account, AccountError, Criteria};
use crate::config::{DB_TABLE_ACCOUNTS, is_valid_table_name};
use crate::storage::{DatabaseAccess, Dialect, QueryOutcome, WriteResult, run};

use super::postgres::*;
use super::queries;
use super::sqlite::*;

/// Persistence operations for [`Account`]
///
/// The store holds no state of its own; every call takes the data store it
/// should run against. Each operation issues at most one statement.
pub struct AccountStore;

impl AccountStore {
    /// Create the accounts table if needed and check its schema.
    #[tracing::instrument(skip(db), fields(dialect = %db.dialect()))]
    pub async fn init(db: &dyn DatabaseAccess) -> Result<(), AccountError> {
        let table = table_name()?;

        match db.dialect() {
            Dialect::Sqlite => {
                create_tables_sqlite(db, table).await?;
                validate_account_tables_sqlite(db, table).await?;
            }
            Dialect::Postgres => {
                create_tables_postgres(db, table).await?;
                validate_account_tables_postgres(db, table).await?;
            }
        }

        tracing::info!(table = %table, "Accounts table ready");
        Ok(())
    }

    /// All accounts matching `criteria`, ordered by id.
    #[tracing::instrument(skip(db, criteria))]
    pub async fn find(
        db: &dyn DatabaseAccess,
        criteria: impl Into<Criteria>,
    ) -> Result<Vec<Account>, AccountError> {
        let criteria = criteria.into();
        tracing::debug!(?criteria, "Finding accounts");

        let statement = queries::select(table_name()?, criteria.into_filter()?);

        let result = run(db, &statement).await.and_then(QueryOutcome::into_rows);
        let rows = match result {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "Account lookup failed");
                return Err(e.into());
            }
        };

        let accounts = rows
            .iter()
            .map(Account::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(found = accounts.len(), "Account lookup completed");
        Ok(accounts)
    }

    /// The first account matching `criteria`, if any.
    #[tracing::instrument(skip(db, criteria))]
    pub async fn find_one(
        db: &dyn DatabaseAccess,
        criteria: impl Into<Criteria>,
    ) -> Result<Option<Account>, AccountError> {
        Ok(Self::find(db, criteria).await?.into_iter().next())
    }

    /// Reload `account` from the store by id, or by name while the id is unset.
    #[tracing::instrument(
        skip(db, account),
        fields(account_id = account.id(), account_name = %account.name())
    )]
    pub async fn fetch(
        db: &dyn DatabaseAccess,
        account: &Account,
    ) -> Result<Option<Account>, AccountError> {
        if account.id() != 0 {
            Self::find_one(db, Criteria::Id(account.id())).await
        } else if !account.name().is_empty() {
            Self::find_one(db, Criteria::Name(account.name().to_string())).await
        } else {
            Err(AccountError::Precondition(
                "Account id or name not set".to_string(),
            ))
        }
    }

    /// Insert the account, or replace the row it corresponds to.
    ///
    /// A new account replaces the row with the same name and takes its id
    /// from the store. An account that already has an id is written under
    /// that id; renaming it onto another account's name is a storage error
    /// and leaves the table unchanged.
    #[tracing::instrument(skip(db, account), fields(account_name = %account.name()))]
    pub async fn save(
        db: &dyn DatabaseAccess,
        account: &mut Account,
    ) -> Result<WriteResult, AccountError> {
        if account.name().is_empty() || account.password().is_none() {
            return Err(AccountError::Precondition(
                "Account name or password not set".to_string(),
            ));
        }

        let statement = queries::upsert(table_name()?, account);

        let result = match run(db, &statement).await.and_then(QueryOutcome::into_write) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Account save failed");
                return Err(e.into());
            }
        };

        if let (0, Some(id)) = (account.id(), result.insert_id) {
            account.set_id(id)?;
        }

        tracing::info!(account_id = account.id(), "Account saved");
        Ok(result)
    }

    /// Remove the row with the account's id.
    #[tracing::instrument(skip(db, account), fields(account_id = account.id()))]
    pub async fn delete(
        db: &dyn DatabaseAccess,
        account: &Account,
    ) -> Result<WriteResult, AccountError> {
        if account.id() == 0 {
            return Err(AccountError::Precondition("Account id not set".to_string()));
        }

        let statement = queries::delete(table_name()?, account.id());

        match run(db, &statement).await.and_then(QueryOutcome::into_write) {
            Ok(result) => {
                tracing::info!(rows_affected = result.rows_affected, "Account deleted");
                Ok(result)
            }
            Err(e) => {
                tracing::error!(error = %e, "Account delete failed");
                Err(e.into())
            }
        }
    }
}

fn table_name() -> Result<&'static str, AccountError> {
    let table = DB_TABLE_ACCOUNTS.as_str();
    if !is_valid_table_name(table) {
        return Err(AccountError::Precondition(format!(
            "Invalid accounts table name '{table}'"
        )));
    }
    Ok(table)
}

impl Account {
    /// See [`AccountStore::fetch`].
    pub async fn fetch(&self, db: &dyn DatabaseAccess) -> Result<Option<Account>, AccountError> {
        AccountStore::fetch(db, self).await
    }

    /// See [`AccountStore::save`].
    pub async fn save(&mut self, db: &dyn DatabaseAccess) -> Result<WriteResult, AccountError> {
        AccountStore::save(db, self).await
    }

    /// See [`AccountStore::delete`].
    pub async fn delete(&self, db: &dyn DatabaseAccess) -> Result<WriteResult, AccountError> {
        AccountStore::delete(db, self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountField;
    use crate::account::password::hash_password;
    use crate::storage::{Row, StatementKind, StorageError, Value};
    use crate::test_utils::MockDatabase;

    fn stored_row(id: i64, name: &str) -> Row {
        Row::new()
            .with("id", id)
            .with("name", name)
            .with("password", hash_password("secret").as_str())
            .with("type", 1)
            .with("premdays", 0)
            .with("lastday", 0)
            .with("email", "")
            .with("creation", 1000)
    }

    #[tokio::test]
    async fn test_find_by_id_filters_on_id() {
        let db = MockDatabase::new();
        db.push_rows(vec![stored_row(42, "bob")]);

        let accounts = AccountStore::find(&db, 42_i64).await.expect("find succeeds");

        let statements = db.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].template.contains(r#"WHERE "id" = :id"#));
        assert_eq!(statements[0].params.get("id"), Some(&Value::Int(42)));
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id(), 42);
    }

    #[tokio::test]
    async fn test_find_by_name_filters_on_name() {
        let db = MockDatabase::new();

        let accounts = AccountStore::find(&db, "bob").await.expect("find succeeds");

        let statements = db.statements();
        assert!(statements[0].template.contains(r#"WHERE "name" = :name"#));
        assert_eq!(statements[0].params.get("name"), Some(&Value::from("bob")));
        assert!(accounts.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_fields_filters_on_type() {
        let db = MockDatabase::new();

        AccountStore::find(&db, Criteria::fields([(AccountField::Type, 3_i64)]))
            .await
            .expect("find succeeds");

        let statements = db.statements();
        assert!(statements[0].template.contains(r#"WHERE "type" = :type"#));
        assert_eq!(statements[0].params.get("type"), Some(&Value::Int(3)));
    }

    #[tokio::test]
    async fn test_find_does_not_rehash_password() {
        let db = MockDatabase::new();
        db.push_rows(vec![stored_row(1, "bob")]);

        let account = AccountStore::find_one(&db, "bob")
            .await
            .expect("find succeeds")
            .expect("account exists");

        assert_eq!(account.password(), Some(hash_password("secret").as_str()));
        assert!(account.verify_password("secret"));
    }

    #[tokio::test]
    async fn test_find_propagates_error_and_releases() {
        let db = MockDatabase::new();
        db.push_error(StorageError::Query("syntax error".to_string()));

        let result = AccountStore::find(&db, 1_i64).await;

        assert_eq!(
            result,
            Err(AccountError::Storage(StorageError::Query(
                "syntax error".to_string()
            )))
        );
        assert_eq!(db.acquired(), 1);
        assert_eq!(db.released(), 1);
    }

    #[tokio::test]
    async fn test_find_with_empty_criteria_issues_no_query() {
        let db = MockDatabase::new();

        let result = AccountStore::find(&db, Criteria::Fields(Vec::new())).await;

        assert!(matches!(result, Err(AccountError::Precondition(_))));
        assert_eq!(db.acquired(), 0);
    }

    #[tokio::test]
    async fn test_find_one_returns_first() {
        let db = MockDatabase::new();
        db.push_rows(vec![stored_row(1, "a"), stored_row(2, "b")]);

        let account = AccountStore::find_one(&db, Criteria::fields([(AccountField::Type, 1_i64)]))
            .await
            .expect("find succeeds");

        assert_eq!(account.map(|a| a.id()), Some(1));
    }

    #[tokio::test]
    async fn test_find_one_none() {
        let db = MockDatabase::new();

        let account = AccountStore::find_one(&db, 99_i64).await.expect("find succeeds");

        assert!(account.is_none());
    }

    #[tokio::test]
    async fn test_fetch_prefers_id() {
        let db = MockDatabase::new();
        let mut account = Account::create("bob", "pw").expect("create");
        account.set_id(5).expect("set id");

        account.fetch(&db).await.expect("fetch succeeds");

        assert_eq!(db.statements()[0].params.get("id"), Some(&Value::Int(5)));
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_name() {
        let db = MockDatabase::new();
        db.push_rows(vec![stored_row(3, "bob")]);
        let account = Account::create("bob", "pw").expect("create");

        let fetched = account.fetch(&db).await.expect("fetch succeeds");

        assert_eq!(
            db.statements()[0].params.get("name"),
            Some(&Value::from("bob"))
        );
        assert_eq!(fetched.map(|a| a.id()), Some(3));
        // The receiver itself is not modified
        assert_eq!(account.id(), 0);
    }

    #[tokio::test]
    async fn test_fetch_without_id_or_name() {
        let db = MockDatabase::new();

        let result = Account::new().fetch(&db).await;

        assert_eq!(
            result,
            Err(AccountError::Precondition(
                "Account id or name not set".to_string()
            ))
        );
        assert_eq!(db.acquired(), 0);
    }

    #[tokio::test]
    async fn test_save_sets_generated_id() {
        // Given a store that reports generated id 7
        let db = MockDatabase::new();
        db.push_write(1, Some(7));
        let mut account = Account::create("bob", "pw").expect("create");

        // When saving a new account
        let result = account.save(&db).await.expect("save succeeds");

        // Then the id is taken from the write result
        assert_eq!(result.insert_id, Some(7));
        assert_eq!(account.id(), 7);

        let statements = db.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].kind,
            StatementKind::ExecuteReturning("id".to_string())
        );
        assert!(statements[0].template.starts_with("INSERT INTO "));
        assert_eq!(
            statements[0].params.get("password"),
            Some(&Value::Text(hash_password("pw")))
        );
        assert_eq!(db.released(), 1);
    }

    #[tokio::test]
    async fn test_save_again_keeps_same_id() {
        let db = MockDatabase::new();
        db.push_write(1, Some(7));
        db.push_write(1, Some(7));
        let mut account = Account::create("bob", "pw").expect("create");

        account.save(&db).await.expect("first save");
        account.set_premdays(30).expect("valid premdays");
        account.save(&db).await.expect("second save");

        assert_eq!(account.id(), 7);
    }

    #[tokio::test]
    async fn test_save_with_id_writes_under_that_id() {
        // Given an account that already carries an id
        let db = MockDatabase::new();
        db.push_write(1, Some(50));
        let mut account = Account::create("zed", "pw").expect("create");
        account.set_id(50).expect("set id");

        // When saving it
        let result = account.save(&db).await.expect("save succeeds");

        // Then the write conflicts on the id rather than the name
        let statements = db.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].template.contains(r#"ON CONFLICT ("id")"#));
        assert_eq!(statements[0].params.get("id"), Some(&Value::Int(50)));
        assert_eq!(result.insert_id, Some(50));
        assert_eq!(account.id(), 50);
    }

    #[tokio::test]
    async fn test_save_renamed_account_keeps_id() {
        let db = MockDatabase::new();
        db.push_write(1, Some(7));
        let mut account = Account::create("bob", "pw").expect("create");
        account.set_id(7).expect("set id");
        account.set_name("alice");

        account.save(&db).await.expect("save succeeds");

        let statements = db.statements();
        assert!(statements[0].template.contains(r#"ON CONFLICT ("id")"#));
        assert_eq!(statements[0].params.get("name"), Some(&Value::from("alice")));
        assert_eq!(account.id(), 7);
    }

    #[tokio::test]
    async fn test_save_without_password_issues_no_query() {
        let db = MockDatabase::new();
        let mut account = Account::new();
        account.set_name("bob");

        let result = account.save(&db).await;

        assert_eq!(
            result,
            Err(AccountError::Precondition(
                "Account name or password not set".to_string()
            ))
        );
        assert_eq!(db.acquired(), 0);
        assert!(db.statements().is_empty());
    }

    #[tokio::test]
    async fn test_save_without_name_issues_no_query() {
        let db = MockDatabase::new();
        let mut account = Account::new();
        account.set_password("pw");

        assert!(matches!(
            account.save(&db).await,
            Err(AccountError::Precondition(_))
        ));
        assert_eq!(db.acquired(), 0);
    }

    #[tokio::test]
    async fn test_save_propagates_error() {
        let db = MockDatabase::new();
        db.push_error(StorageError::Query("disk full".to_string()));
        let mut account = Account::create("bob", "pw").expect("create");

        let result = account.save(&db).await;

        assert!(matches!(result, Err(AccountError::Storage(_))));
        assert_eq!(account.id(), 0);
        assert_eq!(db.released(), 1);
    }

    #[tokio::test]
    async fn test_delete_releases_once_on_success() {
        let db = MockDatabase::new();
        db.push_write(1, None);
        let mut account = Account::create("bob", "pw").expect("create");
        account.set_id(4).expect("set id");

        let result = account.delete(&db).await.expect("delete succeeds");

        assert_eq!(result.rows_affected, 1);
        assert_eq!(db.statements()[0].params.get("id"), Some(&Value::Int(4)));
        assert_eq!(db.acquired(), 1);
        assert_eq!(db.released(), 1);
    }

    #[tokio::test]
    async fn test_delete_releases_once_on_failure() {
        let db = MockDatabase::new();
        db.push_error(StorageError::Query("lock timeout".to_string()));
        let mut account = Account::new();
        account.set_id(4).expect("set id");

        let result = account.delete(&db).await;

        assert!(matches!(result, Err(AccountError::Storage(_))));
        assert_eq!(db.acquired(), 1);
        assert_eq!(db.released(), 1);
    }

    #[tokio::test]
    async fn test_delete_without_id_issues_no_query() {
        let db = MockDatabase::new();

        let result = Account::create("bob", "pw")
            .expect("create")
            .delete(&db)
            .await;

        assert_eq!(
            result,
            Err(AccountError::Precondition("Account id not set".to_string()))
        );
        assert_eq!(db.acquired(), 0);
    }

    #[tokio::test]
    async fn test_acquire_failure_is_propagated() {
        let db = MockDatabase::new();
        db.fail_acquire(StorageError::Connection("too many clients".to_string()));

        let result = AccountStore::find(&db, "bob").await;

        assert_eq!(
            result,
            Err(AccountError::Storage(StorageError::Connection(
                "too many clients".to_string()
            )))
        );
        assert_eq!(db.released(), 0);
    }

    #[tokio::test]
    async fn test_init_runs_postgres_ddl() {
        // Given a Postgres store that reports the expected columns
        let db = MockDatabase::with_dialect(Dialect::Postgres);
        db.push_write(0, None);
        db.push_rows(
            [
                ("id", "bigint"),
                ("name", "text"),
                ("password", "text"),
                ("type", "bigint"),
                ("premdays", "bigint"),
                ("lastday", "bigint"),
                ("email", "text"),
                ("creation", "bigint"),
            ]
            .into_iter()
            .map(|(name, type_)| {
                Row::new()
                    .with("column_name", name)
                    .with("data_type", type_)
            })
            .collect(),
        );

        // When initializing
        AccountStore::init(&db).await.expect("init succeeds");

        // Then the DDL used Postgres types and the schema was checked
        let statements = db.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].template.contains("BIGSERIAL PRIMARY KEY"));
        assert!(statements[1].template.contains("information_schema.columns"));
        assert_eq!(db.released(), 2);
    }

    #[tokio::test]
    async fn test_init_reports_schema_drift() {
        let db = MockDatabase::with_dialect(Dialect::Postgres);
        db.push_write(0, None);
        db.push_rows(vec![
            Row::new()
                .with("column_name", "id")
                .with("data_type", "integer"),
        ]);

        let result = AccountStore::init(&db).await;

        match result {
            Err(AccountError::Storage(StorageError::Schema(msg))) => {
                assert!(msg.contains("Column 'id' has type 'integer'"))
            }
            other => panic!("Expected schema error, got {other:?}"),
        }
    }
}
