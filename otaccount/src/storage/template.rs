//! Rendering of `:name` placeholder templates into positional SQL

use super::errors::StorageError;
use super::types::{Dialect, Params, Value};

/// SQL text ready for the driver plus parameters in bind order
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderedQuery {
    pub(crate) sql: String,
    pub(crate) values: Vec<Value>,
}

/// Replace every `:name` placeholder with the dialect's positional marker.
///
/// Text inside single-quoted literals and double-quoted identifiers is copied
/// verbatim, as is a PostgreSQL `::` cast. A placeholder may appear more than
/// once; each occurrence binds its own copy of the value.
pub(crate) fn render(
    template: &str,
    params: &Params,
    dialect: Dialect,
) -> Result<RenderedQuery, StorageError> {
    let chars: Vec<char> = template.chars().collect();
    let mut sql = String::with_capacity(template.len());
    let mut values = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let end = closing_quote(&chars, i, c)?;
                sql.extend(&chars[i..=end]);
                i = end + 1;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                sql.push_str("::");
                i += 2;
            }
            ':' if chars.get(i + 1).is_some_and(|n| is_ident_start(*n)) => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let value = params.get(&name).ok_or_else(|| {
                    StorageError::Template(format!("No value bound for placeholder ':{name}'"))
                })?;
                values.push(value.clone());
                match dialect {
                    Dialect::Sqlite => sql.push('?'),
                    Dialect::Postgres => sql.push_str(&format!("${}", values.len())),
                }
                i = end;
            }
            _ => {
                sql.push(c);
                i += 1;
            }
        }
    }

    Ok(RenderedQuery { sql, values })
}

// Doubled quote characters escape themselves in both dialects.
fn closing_quote(chars: &[char], open: usize, quote: char) -> Result<usize, StorageError> {
    let mut i = open + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return Ok(i);
        }
        i += 1;
    }
    Err(StorageError::Template(format!(
        "Unterminated {quote} quote starting at offset {open}"
    )))
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
