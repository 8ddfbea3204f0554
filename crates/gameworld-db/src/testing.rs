//! In-process connector used by the pool and executor tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::connection::{Connector, StoreConnection};
use crate::error::{DbError, DbResult};

/// Shared observation point for everything the mock connections do.
#[derive(Debug, Default)]
pub struct MockState {
    pub opened: AtomicUsize,
    pub fail_connect: AtomicBool,
    pub fail_commit: AtomicBool,
    pub fail_rollback: AtomicBool,
    pub statements: Mutex<Vec<String>>,
}

impl MockState {
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn record(&self, id: usize, statement: &str) {
        if let Ok(mut s) = self.statements.lock() {
            s.push(format!("{}:{}", id, statement));
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    pub state: Arc<MockState>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct MockConnection {
    pub id: usize,
    pub broken: bool,
    pub in_transaction: bool,
    /// Set by tests while "using" the connection to detect sharing.
    pub busy: Arc<AtomicBool>,
    state: Arc<MockState>,
}

#[async_trait]
impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self) -> DbResult<MockConnection> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(DbError::ConnectionFailed("connection refused".to_string()));
        }
        let id = self.state.opened.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MockConnection {
            id,
            broken: false,
            in_transaction: false,
            busy: Arc::new(AtomicBool::new(false)),
            state: self.state.clone(),
        })
    }
}

#[async_trait]
impl StoreConnection for MockConnection {
    fn is_open(&self) -> bool {
        !self.broken && !self.in_transaction
    }

    fn mark_broken(&mut self) {
        self.broken = true;
    }

    async fn begin(&mut self) -> DbResult<()> {
        self.state.record(self.id, "BEGIN");
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.state.record(self.id, "COMMIT");
        if self.state.fail_commit.load(Ordering::SeqCst) {
            return Err(DbError::from_sqlstate("40001", None, "could not serialize access"));
        }
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.state.record(self.id, "ROLLBACK");
        if self.state.fail_rollback.load(Ordering::SeqCst) {
            return Err(DbError::ConnectionFailed("server closed the connection".to_string()));
        }
        self.in_transaction = false;
        Ok(())
    }
}
