//! otaccount - Game server account storage
//!
//! This crate models a login account for a multiplayer game server, enforces
//! its field constraints, and persists it to SQLite or PostgreSQL through
//! sqlx. The data store is passed into every operation explicitly.
//!
//! ```no_run
//! use otaccount::{Account, AccountStore, DataStoreConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DataStoreConfig::from_env()?.connect()?;
//! AccountStore::init(db.as_ref()).await?;
//!
//! let mut account = Account::create("bob", "secret")?;
//! account.set_premdays(30)?;
//! account.save(db.as_ref()).await?;
//!
//! let found = AccountStore::find_one(db.as_ref(), "bob").await?;
//! assert!(found.is_some_and(|a| a.verify_password("secret")));
//! # Ok(())
//! # }
//! ```

mod account;
mod config;
mod storage;

#[cfg(test)]
mod test_utils;

pub use account::{
    Account, AccountError, AccountField, AccountStore, CreationTime, Criteria, MAX_ACCOUNT_TYPE,
    MAX_PREMDAYS, MIN_ACCOUNT_TYPE,
};

pub use config::{DB_TABLE_ACCOUNTS, DB_TABLE_PREFIX};

pub use storage::{
    Connection, DataStoreConfig, DatabaseAccess, Dialect, Params, PostgresDataStore, QueryOutcome,
    Row, SqliteDataStore, Statement, StatementKind, StorageError, StoreType, Value, WriteResult,
    run,
};
