//! # Store Connections
//!
//! The seam between the pool and the driver.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ConnectionPool<C: Connector>                                           │
//! │       │  connect()                                                      │
//! │       ▼                                                                 │
//! │  C::Connection: StoreConnection                                         │
//! │       ├── is_open()      ← checked on every release                     │
//! │       ├── mark_broken()  ← set by the executor on transport errors      │
//! │       └── begin / commit / rollback                                     │
//! │                                                                         │
//! │  Production: PgConnector → PgStoreConnection (sqlx::PgConnection)       │
//! │  Tests:      in-process mock connectors                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection, Executor};
use std::ops::{Deref, DerefMut};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Opens new store connections on behalf of the pool.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: StoreConnection;

    async fn connect(&self) -> DbResult<Self::Connection>;
}

/// A single live connection as seen by the pool and the executor.
#[async_trait]
pub trait StoreConnection: Send + 'static {
    /// False once the connection must not be reused: broken transport, or a
    /// transaction left open (e.g. by a cancelled operation).
    fn is_open(&self) -> bool;

    fn mark_broken(&mut self);

    async fn begin(&mut self) -> DbResult<()>;

    async fn commit(&mut self) -> DbResult<()>;

    async fn rollback(&mut self) -> DbResult<()>;
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// Opens PostgreSQL connections from a fixed set of options.
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
}

impl PgConnector {
    pub fn new(options: PgConnectOptions) -> Self {
        PgConnector { options }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = PgStoreConnection;

    async fn connect(&self) -> DbResult<PgStoreConnection> {
        let inner = self
            .options
            .connect()
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!("Opened PostgreSQL connection");
        Ok(PgStoreConnection {
            inner,
            broken: false,
            in_transaction: false,
        })
    }
}

/// A pooled PostgreSQL connection.
///
/// Derefs to [`PgConnection`] so repository code can pass `&mut **conn`
/// straight to sqlx.
#[derive(Debug)]
pub struct PgStoreConnection {
    inner: PgConnection,
    broken: bool,
    in_transaction: bool,
}

impl PgStoreConnection {
    async fn run(&mut self, statement: &str) -> DbResult<()> {
        match self.inner.execute(statement).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = DbError::from(e);
                if err.is_connection_error() {
                    self.broken = true;
                }
                Err(err)
            }
        }
    }

    /// Pings the server.
    pub async fn ping(&mut self) -> DbResult<()> {
        self.inner.ping().await.map_err(DbError::from)
    }
}

impl Deref for PgStoreConnection {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        &self.inner
    }
}

impl DerefMut for PgStoreConnection {
    fn deref_mut(&mut self) -> &mut PgConnection {
        &mut self.inner
    }
}

#[async_trait]
impl StoreConnection for PgStoreConnection {
    fn is_open(&self) -> bool {
        !self.broken && !self.in_transaction
    }

    fn mark_broken(&mut self) {
        self.broken = true;
    }

    async fn begin(&mut self) -> DbResult<()> {
        self.run("BEGIN").await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.run("COMMIT").await?;
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.run("ROLLBACK").await?;
        self.in_transaction = false;
        Ok(())
    }
}
