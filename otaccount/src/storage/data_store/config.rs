//! Data store selection from the environment

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use crate::storage::errors::StorageError;
use crate::storage::types::DatabaseAccess;

use super::postgres::PostgresDataStore;
use super::sqlite::SqliteDataStore;

const STORE_TYPE_VAR: &str = "GENERIC_DATA_STORE_TYPE";
const STORE_URL_VAR: &str = "GENERIC_DATA_STORE_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Sqlite,
    Postgres,
}

impl FromStr for StoreType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(StoreType::Sqlite),
            "postgres" => Ok(StoreType::Postgres),
            t => Err(StorageError::Config(format!(
                "Unsupported store type: {t}. Supported types are 'sqlite' and 'postgres'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataStoreConfig {
    pub store_type: StoreType,
    pub url: String,
}

impl DataStoreConfig {
    /// Read `GENERIC_DATA_STORE_TYPE` and `GENERIC_DATA_STORE_URL`.
    pub fn from_env() -> Result<Self, StorageError> {
        let store_type = env::var(STORE_TYPE_VAR)
            .map_err(|_| StorageError::Config(format!("{STORE_TYPE_VAR} must be set")))?
            .parse()?;
        let url = env::var(STORE_URL_VAR)
            .map_err(|_| StorageError::Config(format!("{STORE_URL_VAR} must be set")))?;

        Ok(Self { store_type, url })
    }

    /// Build the configured store. Connections are opened on first use.
    pub fn connect(&self) -> Result<Arc<dyn DatabaseAccess>, StorageError> {
        tracing::info!(
            store_type = ?self.store_type,
            "Initializing data store"
        );

        let store: Arc<dyn DatabaseAccess> = match self.store_type {
            StoreType::Sqlite => Arc::new(SqliteDataStore::connect_lazy(&self.url)?),
            StoreType::Postgres => Arc::new(PostgresDataStore::connect_lazy(&self.url)?),
        };

        Ok(store)
    }
}
