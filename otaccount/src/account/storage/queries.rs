//! Statement builders for the accounts table
//!
//! Templates use `:column` placeholders and double-quoted identifiers, which
//! both supported dialects understand.

use crate::account::field::AccountField;
use crate::account::types::Account;
use crate::storage::{Statement, Value};

fn quoted(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

fn column_list(fields: &[AccountField]) -> String {
    fields
        .iter()
        .map(|f| quoted(f.column()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every column except the generated id
const WRITABLE: [AccountField; 7] = [
    AccountField::Name,
    AccountField::Password,
    AccountField::Type,
    AccountField::Premdays,
    AccountField::Lastday,
    AccountField::Email,
    AccountField::Creation,
];

pub(super) fn select(table: &str, filter: Vec<(AccountField, Value)>) -> Statement {
    // A field filtered twice gets an indexed placeholder for the repeat.
    let names: Vec<String> = filter
        .iter()
        .enumerate()
        .map(|(i, (field, _))| {
            if filter[..i].iter().any(|(f, _)| f == field) {
                format!("{}_{i}", field.column())
            } else {
                field.column().to_string()
            }
        })
        .collect();

    let conditions = filter
        .iter()
        .zip(&names)
        .map(|((field, _), name)| format!("{} = :{name}", quoted(field.column())))
        .collect::<Vec<_>>()
        .join(" AND ");

    let template = format!(
        "SELECT {} FROM {} WHERE {conditions} ORDER BY {}",
        column_list(&AccountField::ALL),
        quoted(table),
        quoted(AccountField::Id.column()),
    );

    filter
        .into_iter()
        .zip(names)
        .fold(Statement::fetch(template), |statement, ((_, value), name)| {
            statement.bind(name, value)
        })
}

/// Insert, or replace every column of the conflicting row.
///
/// An unsaved account conflicts on its name. An account that already has an
/// id is written under that id, so a renamed account updates its own row.
pub(super) fn upsert(table: &str, account: &Account) -> Statement {
    let (columns, key): (&[AccountField], AccountField) = if account.id() == 0 {
        (&WRITABLE[..], AccountField::Name)
    } else {
        (&AccountField::ALL[..], AccountField::Id)
    };

    let placeholders = columns
        .iter()
        .map(|f| format!(":{}", f.column()))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = columns
        .iter()
        .filter(|f| **f != key)
        .map(|f| format!("{0} = excluded.{0}", quoted(f.column())))
        .collect::<Vec<_>>()
        .join(", ");

    let template = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders}) ON CONFLICT ({}) DO UPDATE SET {updates} RETURNING {}",
        quoted(table),
        column_list(columns),
        quoted(key.column()),
        quoted(AccountField::Id.column()),
    );

    let mut params = account.to_params();
    if account.id() == 0 {
        params.remove(AccountField::Id.column());
    }
    Statement::execute_returning(template, AccountField::Id.column()).bind_all(params)
}

pub(super) fn delete(table: &str, id: i64) -> Statement {
    Statement::execute(format!(
        "DELETE FROM {} WHERE {} = :id",
        quoted(table),
        quoted(AccountField::Id.column())
    ))
    .bind(AccountField::Id.column(), id)
}
