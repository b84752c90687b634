use std::sync::{Arc, Once};

use otaccount::{AccountStore, DataStoreConfig, DatabaseAccess, SqliteDataStore};

/// Load `.env_test` once per test binary.
pub fn init_test_environment() {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        if dotenvy::from_filename(".env_test").is_err() {
            dotenvy::dotenv().ok();
        }
    });
}

/// A fresh in-memory SQLite store with the accounts table created
pub async fn fresh_store() -> SqliteDataStore {
    let store = SqliteDataStore::connect_lazy("sqlite::memory:").expect("valid sqlite url");
    AccountStore::init(&store)
        .await
        .expect("accounts table should initialize");
    store
}

/// The store described by the test environment, initialized
pub async fn store_from_env() -> Arc<dyn DatabaseAccess> {
    init_test_environment();
    let store = DataStoreConfig::from_env()
        .and_then(|config| config.connect())
        .expect("test environment should describe a data store");
    AccountStore::init(store.as_ref())
        .await
        .expect("accounts table should initialize");
    store
}
