//! # Database Handle
//!
//! Connection parameters and the transactional executor.
//!
//! ## Execution Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      One Logical Operation                              │
//! │                                                                         │
//! │  execute_query(op)               execute_transaction(op)                │
//! │       │                               │                                 │
//! │       ▼                               ▼                                 │
//! │  pool.acquire()                  pool.acquire()                         │
//! │       │                               │                                 │
//! │       ▼                               ▼                                 │
//! │  op(conn)                        BEGIN → op(conn) → COMMIT              │
//! │       │                               │        │                        │
//! │       │                               │        └─ error → ROLLBACK      │
//! │       ▼                               ▼                                 │
//! │  handle dropped ─────────────► released exactly once                    │
//! │  (broken / mid-transaction connections are discarded instead)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Operations are closures returning a boxed future that borrows the
//! connection. Anything else they use must be owned:
//!
//! ```rust,ignore
//! let id = id.to_string();
//! db.execute_query(move |conn| Box::pin(async move {
//!     sqlx::query("SELECT 1 FROM celestial_objects WHERE id = $1")
//!         .bind(id)
//!         .fetch_optional(&mut **conn)
//!         .await
//!         .map_err(DbError::from)
//! })).await?;
//! ```

use futures::future::BoxFuture;
use sqlx::postgres::PgConnectOptions;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, info_span, warn, Span};

use crate::connection::{Connector, PgConnector, StoreConnection};
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::pool::{ConnectionPool, PoolOptions, PoolStatus};
use crate::repository::ObjectRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Store connection parameters.
///
/// ## Example
/// ```rust
/// use gameworld_db::DbConfig;
///
/// let config = DbConfig::new("db.internal", "gameworld", "game")
///     .password("s3cret")
///     .max_connections(12);
///
/// assert_eq!(
///     config.connection_string(),
///     "host=db.internal port=5432 dbname=gameworld user=game password=s3cret"
/// );
/// assert!(!config.to_string().contains("s3cret"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,

    /// Maximum number of connections in the pool.
    /// Default: 10
    pub max_connections: usize,

    /// How long a caller waits for a pooled connection.
    /// Default: 30 seconds, `None` waits indefinitely.
    pub acquire_timeout: Option<Duration>,
}

impl DbConfig {
    pub fn new(host: impl Into<String>, dbname: impl Into<String>, user: impl Into<String>) -> Self {
        DbConfig {
            host: host.into(),
            port: 5432,
            dbname: dbname.into(),
            user: user.into(),
            password: String::new(),
            max_connections: 10,
            acquire_timeout: Some(Duration::from_secs(30)),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// The libpq-style descriptor `host=… port=… dbname=… user=… password=…`.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.dbname, self.user, self.password
        )
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions::new(self.max_connections).acquire_timeout(self.acquire_timeout)
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.user)
            .password(&self.password)
    }
}

/// Parses a `key=value` descriptor produced by [`DbConfig::connection_string`].
///
/// Unset keys keep their defaults; unknown keys are rejected.
impl FromStr for DbConfig {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = DbConfig::new("localhost", "gameworld", "postgres");
        for pair in s.split_whitespace() {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                DbError::Internal(format!("malformed connection parameter: {}", pair))
            })?;
            match key {
                "host" => config.host = value.to_string(),
                "port" => {
                    config.port = value
                        .parse()
                        .map_err(|_| DbError::Internal(format!("invalid port: {}", value)))?
                }
                "dbname" => config.dbname = value.to_string(),
                "user" => config.user = value.to_string(),
                "password" => config.password = value.to_string(),
                other => {
                    return Err(DbError::Internal(format!(
                        "unknown connection parameter: {}",
                        other
                    )))
                }
            }
        }
        Ok(config)
    }
}

impl fmt::Display for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={} port={} dbname={} user={} password=****",
            self.host, self.port, self.dbname, self.user
        )
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"****")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle: the pool plus transactional execution.
///
/// Cheap to clone; all clones share one pool.
#[derive(Debug, Clone)]
pub struct Database<C: Connector = PgConnector> {
    pool: ConnectionPool<C>,
    span: Span,
}

impl Database<PgConnector> {
    /// Opens the pool against PostgreSQL.
    ///
    /// ## Errors
    /// * `DbError::ConnectionFailed` - a warm-up connection could not be opened
    pub async fn connect(config: &DbConfig) -> DbResult<Self> {
        info!(target: "gameworld_db", config = %config, "Initializing database connection");

        let span = info_span!("db", host = %config.host, dbname = %config.dbname);
        let pool = ConnectionPool::new(
            PgConnector::new(config.connect_options()),
            config.pool_options(),
            span.clone(),
        )
        .await?;

        Ok(Database { pool, span })
    }

    /// Applies pending embedded migrations.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!(parent: &self.span, "Running database migrations");
        // The migrator's future is not general over the connection lifetime,
        // so it is driven on a directly acquired connection.
        let mut conn = self.pool.acquire().await?;
        if let Err(e) = migrations::run_migrations(&mut conn).await {
            if e.is_connection_error() {
                conn.mark_broken();
            }
            return Err(e);
        }
        info!(parent: &self.span, "Migrations complete");
        Ok(())
    }

    /// Tuple of (embedded, applied) migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        self.execute_query(|conn| Box::pin(migrations::migration_status(&mut **conn)))
            .await
    }

    /// Checks if the database answers a ping.
    pub async fn health_check(&self) -> bool {
        self.execute_query(|conn| Box::pin(conn.ping()))
            .await
            .is_ok()
    }

    /// Returns the celestial object repository.
    pub fn objects(&self) -> ObjectRepository {
        ObjectRepository::new(self.clone())
    }
}

impl<C: Connector> Database<C> {
    /// Wraps an existing pool.
    pub fn with_pool(pool: ConnectionPool<C>, span: Span) -> Self {
        Database { pool, span }
    }

    pub fn pool(&self) -> &ConnectionPool<C> {
        &self.pool
    }

    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Runs `op` on a pooled connection without a transaction.
    ///
    /// The connection is released on every exit path and `op`'s result is
    /// returned unchanged.
    pub async fn execute_query<T, F>(&self, op: F) -> DbResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut C::Connection) -> BoxFuture<'c, DbResult<T>> + Send,
    {
        let mut conn = self.pool.acquire().await?;
        let result = op(&mut *conn).await;
        if let Err(e) = &result {
            if e.is_connection_error() {
                conn.mark_broken();
            }
        }
        result
    }

    /// Runs `op` inside BEGIN/COMMIT.
    ///
    /// On failure in `op` or in COMMIT the transaction is rolled back and
    /// the original error is returned. A connection whose rollback fails is
    /// discarded.
    pub async fn execute_transaction<T, F>(&self, op: F) -> DbResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut C::Connection) -> BoxFuture<'c, DbResult<T>> + Send,
    {
        let mut conn = self.pool.acquire().await?;

        if let Err(e) = conn.begin().await {
            if e.is_connection_error() {
                conn.mark_broken();
            }
            return Err(e);
        }

        let failure = match op(&mut *conn).await {
            Ok(value) => match conn.commit().await {
                Ok(()) => return Ok(value),
                Err(e) => e,
            },
            Err(e) => e,
        };

        if failure.is_connection_error() {
            // The server aborts the transaction when the session dies.
            conn.mark_broken();
            return Err(failure);
        }

        if let Err(rollback_err) = conn.rollback().await {
            warn!(
                parent: &self.span,
                error = %rollback_err,
                original = %failure,
                "Rollback failed, discarding connection"
            );
            conn.mark_broken();
        }
        Err(failure)
    }

    /// Closes the pool. Outstanding operations finish; new ones fail.
    pub fn close(&self) {
        info!(parent: &self.span, "Closing database connection pool");
        self.pool.close();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
