//! Central configuration for the otaccount crate

use std::env;
use std::sync::LazyLock;

/// Table prefix from environment variable. Default: empty
pub static DB_TABLE_PREFIX: LazyLock<String> =
    LazyLock::new(|| env::var("DB_TABLE_PREFIX").unwrap_or_default());

/// Accounts table name. Default: "{DB_TABLE_PREFIX}accounts"
pub static DB_TABLE_ACCOUNTS: LazyLock<String> = LazyLock::new(|| {
    env::var("DB_TABLE_ACCOUNTS").unwrap_or_else(|_| format!("{}{}", *DB_TABLE_PREFIX, "accounts"))
});

/// Table names are spliced into SQL text, so only plain identifiers are accepted.
pub(crate) fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
