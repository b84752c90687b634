//! Test utilities shared across the crate's unit tests
//!
//! [`MockDatabase`] stands in for a real data store. Responses are scripted
//! up front; every statement it receives is recorded, and acquires and
//! releases are counted so tests can check the release-on-every-path rule.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::storage::{
    Connection, DatabaseAccess, Dialect, QueryOutcome, Row, Statement, StatementKind,
    StorageError, WriteResult,
};

#[derive(Default)]
struct MockState {
    responses: VecDeque<Result<QueryOutcome, StorageError>>,
    acquire_error: Option<StorageError>,
    statements: Vec<Statement>,
    acquired: usize,
    released: usize,
}

#[derive(Clone)]
pub(crate) struct MockDatabase {
    dialect: Dialect,
    state: Arc<Mutex<MockState>>,
}

impl MockDatabase {
    pub(crate) fn new() -> Self {
        Self::with_dialect(Dialect::Sqlite)
    }

    pub(crate) fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock poisoned")
    }

    pub(crate) fn push_rows(&self, rows: Vec<Row>) {
        self.state()
            .responses
            .push_back(Ok(QueryOutcome::Rows(rows)));
    }

    pub(crate) fn push_write(&self, rows_affected: u64, insert_id: Option<i64>) {
        self.state()
            .responses
            .push_back(Ok(QueryOutcome::Write(WriteResult {
                rows_affected,
                insert_id,
            })));
    }

    pub(crate) fn push_error(&self, error: StorageError) {
        self.state().responses.push_back(Err(error));
    }

    pub(crate) fn fail_acquire(&self, error: StorageError) {
        self.state().acquire_error = Some(error);
    }

    pub(crate) fn statements(&self) -> Vec<Statement> {
        self.state().statements.clone()
    }

    pub(crate) fn acquired(&self) -> usize {
        self.state().acquired
    }

    pub(crate) fn released(&self) -> usize {
        self.state().released
    }
}

#[async_trait]
impl DatabaseAccess for MockDatabase {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn acquire(&self) -> Result<Box<dyn Connection>, StorageError> {
        let mut state = self.state();
        if let Some(err) = state.acquire_error.clone() {
            return Err(err);
        }
        state.acquired += 1;
        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn query(&mut self, statement: &Statement) -> Result<QueryOutcome, StorageError> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        state.statements.push(statement.clone());
        match state.responses.pop_front() {
            Some(response) => response,
            None => Ok(match statement.kind {
                StatementKind::Fetch => QueryOutcome::Rows(Vec::new()),
                _ => QueryOutcome::Write(WriteResult::default()),
            }),
        }
    }

    fn release(self: Box<Self>) {
        self.state
            .lock()
            .expect("mock state lock poisoned")
            .released += 1;
    }
}
