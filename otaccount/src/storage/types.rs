use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

use super::errors::StorageError;

/// SQL flavour spoken by a data store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// A single bound parameter or column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
        }
    }
}

/// Named parameters bound into a statement template
pub type Params = HashMap<String, Value>;

/// One fetched row, keyed by column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }
}

/// What the data store is expected to hand back for a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// Return every matching row
    Fetch,
    /// Write without a generated identifier
    Execute,
    /// Write and report the named column of the written row as `insert_id`
    ExecuteReturning(String),
}

/// A templated statement with `:name` placeholders and its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub template: String,
    pub params: Params,
    pub kind: StatementKind,
}

impl Statement {
    pub fn fetch(template: impl Into<String>) -> Self {
        Self::with_kind(template, StatementKind::Fetch)
    }

    pub fn execute(template: impl Into<String>) -> Self {
        Self::with_kind(template, StatementKind::Execute)
    }

    pub fn execute_returning(template: impl Into<String>, column: impl Into<String>) -> Self {
        Self::with_kind(template, StatementKind::ExecuteReturning(column.into()))
    }

    fn with_kind(template: impl Into<String>, kind: StatementKind) -> Self {
        Self {
            template: template.into(),
            params: Params::new(),
            kind,
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn bind_all(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }
}

/// Result of a write statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    pub rows_affected: u64,
    /// Identifier generated (or matched) by the write, when the statement asked for one
    pub insert_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    Write(WriteResult),
}

impl QueryOutcome {
    pub fn into_rows(self) -> Result<Vec<Row>, StorageError> {
        match self {
            QueryOutcome::Rows(rows) => Ok(rows),
            QueryOutcome::Write(_) => Err(StorageError::Query(
                "Expected rows but the statement returned a write result".to_string(),
            )),
        }
    }

    pub fn into_write(self) -> Result<WriteResult, StorageError> {
        match self {
            QueryOutcome::Write(result) => Ok(result),
            QueryOutcome::Rows(_) => Err(StorageError::Query(
                "Expected a write result but the statement returned rows".to_string(),
            )),
        }
    }
}

/// Pooled access to a relational database.
///
/// Implementations hand out one [`Connection`] per unit of work. The caller
/// issues its statement and hands the connection back with
/// [`Connection::release`]; [`super::run`] wraps that sequence.
#[async_trait]
pub trait DatabaseAccess: Send + Sync {
    /// SQL dialect used when rendering placeholders and DDL
    fn dialect(&self) -> Dialect;

    /// Acquire a connection from the pool.
    async fn acquire(&self) -> Result<Box<dyn Connection>, StorageError>;
}

/// A connection checked out from a [`DatabaseAccess`] pool
#[async_trait]
pub trait Connection: Send {
    /// Execute one statement.
    async fn query(&mut self, statement: &Statement) -> Result<QueryOutcome, StorageError>;

    /// Return the connection to its pool.
    fn release(self: Box<Self>);
}
