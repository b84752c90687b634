mod config;
mod postgres;
mod sqlite;

pub use config::{DataStoreConfig, StoreType};
pub use postgres::PostgresDataStore;
pub use sqlite::SqliteDataStore;
