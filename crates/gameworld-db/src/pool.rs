//! # Connection Pool
//!
//! A bounded pool of store connections shared by every in-flight request.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Connection Pool                                    │
//! │                                                                         │
//! │  ConnectionPool::new(connector, options, span)                          │
//! │       │  warm-up: opens ⌊max/3⌋ connections                             │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                            │
//! │  │  Mutex<PoolState>                        │                           │
//! │  │   available: [c1] [c2]                   │  reuse first              │
//! │  │   in_use:    {3, 4}                      │  |available|+|in_use|≤max │
//! │  └─────────────────────────────────────────┘                            │
//! │       │                                                                 │
//! │  acquire() ──► reuse │ open new │ park on Notify                        │
//! │  drop(handle) ──► back to available, or discarded if !is_open()         │
//! │                   then wake one waiter                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The mutex is never held across an await. New connections are opened
//! outside the lock after reserving an in-use slot, so a slow connect never
//! blocks releases.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, info, warn, Span};

use crate::connection::{Connector, StoreConnection};
use crate::error::{DbError, DbResult};

// =============================================================================
// Configuration
// =============================================================================

/// Pool sizing and wait behaviour.
///
/// ## Example
/// ```rust
/// use gameworld_db::PoolOptions;
/// use std::time::Duration;
///
/// let options = PoolOptions::new(12).acquire_timeout(Some(Duration::from_secs(5)));
/// assert_eq!(options.warm_up_count(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Upper bound on open connections.
    pub max_connections: usize,

    /// How long `acquire` waits for a free slot.
    /// `None` waits indefinitely. Default: 30 seconds.
    pub acquire_timeout: Option<Duration>,
}

impl PoolOptions {
    pub fn new(max_connections: usize) -> Self {
        PoolOptions {
            max_connections,
            acquire_timeout: Some(Duration::from_secs(30)),
        }
    }

    pub fn acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Connections opened eagerly at construction.
    pub fn warm_up_count(&self) -> usize {
        self.max_connections / 3
    }
}

impl Default for PoolOptions {
    fn default() -> Self {
        PoolOptions::new(10)
    }
}

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub available: usize,
    pub in_use: usize,
    pub max: usize,
}

// =============================================================================
// Pool
// =============================================================================

/// Bounded connection pool, generic over how connections are opened.
///
/// Cloning is cheap and yields a handle to the same pool.
pub struct ConnectionPool<C: Connector> {
    inner: Arc<PoolInner<C>>,
}

struct PoolInner<C: Connector> {
    connector: C,
    state: Mutex<PoolState<C::Connection>>,
    notify: Notify,
    max_connections: usize,
    acquire_timeout: Option<Duration>,
    span: Span,
}

struct PoolState<T> {
    available: VecDeque<(u64, T)>,
    in_use: HashSet<u64>,
    next_id: u64,
    closed: bool,
}

impl<T> PoolState<T> {
    fn reserve_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.in_use.insert(id);
        id
    }
}

enum Checkout<T> {
    Reuse(u64, T),
    Open(u64),
    Wait,
}

impl<C: Connector> Clone for ConnectionPool<C> {
    fn clone(&self) -> Self {
        ConnectionPool {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Connector> fmt::Debug for ConnectionPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("status", &self.status())
            .field("acquire_timeout", &self.inner.acquire_timeout)
            .finish()
    }
}

impl<C: Connector> ConnectionPool<C> {
    /// Creates the pool and opens the warm-up connections.
    ///
    /// ## Errors
    /// * `DbError::Internal` - `max_connections` is zero
    /// * any error from the connector while warming up, unchanged
    pub async fn new(connector: C, options: PoolOptions, span: Span) -> DbResult<Self> {
        if options.max_connections == 0 {
            return Err(DbError::Internal(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let warm_up = options.warm_up_count();
        let mut available = VecDeque::with_capacity(options.max_connections);
        for id in 0..warm_up as u64 {
            let conn = connector.connect().await?;
            available.push_back((id, conn));
        }

        info!(
            parent: &span,
            max_connections = options.max_connections,
            warm_up,
            "Connection pool created"
        );

        Ok(ConnectionPool {
            inner: Arc::new(PoolInner {
                connector,
                state: Mutex::new(PoolState {
                    available,
                    in_use: HashSet::new(),
                    next_id: warm_up as u64,
                    closed: false,
                }),
                notify: Notify::new(),
                max_connections: options.max_connections,
                acquire_timeout: options.acquire_timeout,
                span,
            }),
        })
    }

    /// Checks out a connection.
    ///
    /// Reuses an idle connection when one exists, otherwise opens a new one
    /// while under the limit, otherwise waits for a release.
    ///
    /// ## Errors
    /// * `DbError::PoolExhausted` - the acquire timeout elapsed
    /// * `DbError::PoolClosed` - the pool was closed
    /// * connector errors, unchanged
    pub async fn acquire(&self) -> DbResult<PooledConnection<C>> {
        match self.inner.acquire_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.checkout()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        parent: &self.inner.span,
                        timeout = ?limit,
                        "Timed out waiting for a pooled connection"
                    );
                    Err(DbError::PoolExhausted)
                }
            },
            None => self.checkout().await,
        }
    }

    async fn checkout(&self) -> DbResult<PooledConnection<C>> {
        loop {
            // Register interest before inspecting state so a release that
            // lands between the check and the await is not missed.
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let step = {
                let mut state = self.inner.lock();
                if state.closed {
                    return Err(DbError::PoolClosed);
                }
                if let Some((id, conn)) = state.available.pop_front() {
                    state.in_use.insert(id);
                    Checkout::Reuse(id, conn)
                } else if state.in_use.len() < self.inner.max_connections {
                    Checkout::Open(state.reserve_id())
                } else {
                    Checkout::Wait
                }
            };

            match step {
                Checkout::Reuse(id, conn) => {
                    debug!(parent: &self.inner.span, id, "Reusing pooled connection");
                    return Ok(PooledConnection::new(self.inner.clone(), id, conn));
                }
                Checkout::Open(id) => {
                    let reservation = Reservation {
                        pool: self.inner.as_ref(),
                        id,
                        armed: true,
                    };
                    let conn = self.inner.connector.connect().await?;
                    reservation.disarm();
                    debug!(parent: &self.inner.span, id, "Opened pooled connection");
                    return Ok(PooledConnection::new(self.inner.clone(), id, conn));
                }
                Checkout::Wait => notified.await,
            }
        }
    }

    /// Returns a connection to the pool.
    ///
    /// Equivalent to dropping the handle.
    pub fn release(&self, conn: PooledConnection<C>) {
        drop(conn);
    }

    /// Closes the pool.
    ///
    /// Idle connections are dropped immediately, in-use handles are
    /// forgotten (their later release is treated as unrecognised) and every
    /// waiter fails with `PoolClosed`.
    pub fn close(&self) {
        let drained = {
            let mut state = self.inner.lock();
            state.closed = true;
            state.in_use.clear();
            std::mem::take(&mut state.available)
        };
        info!(
            parent: &self.inner.span,
            idle_closed = drained.len(),
            "Connection pool closed"
        );
        drop(drained);
        self.inner.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.inner.lock();
        PoolStatus {
            available: state.available.len(),
            in_use: state.in_use.len(),
            max: self.inner.max_connections,
        }
    }
}

impl<C: Connector> PoolInner<C> {
    fn lock(&self) -> MutexGuard<'_, PoolState<C::Connection>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn give_back(&self, id: u64, conn: C::Connection) {
        {
            let mut state = self.lock();
            if !state.in_use.remove(&id) {
                warn!(parent: &self.span, id, "Released connection is not tracked by this pool");
            } else if conn.is_open() && !state.closed {
                state.available.push_back((id, conn));
            } else {
                debug!(parent: &self.span, id, "Discarding connection that is no longer open");
            }
        }
        self.notify.notify_one();
    }

    fn forget(&self, id: u64) {
        self.lock().in_use.remove(&id);
        self.notify.notify_one();
    }
}

/// Holds an in-use slot while a new connection is being opened.
///
/// Frees the slot if the connect fails or the acquiring future is dropped.
struct Reservation<'a, C: Connector> {
    pool: &'a PoolInner<C>,
    id: u64,
    armed: bool,
}

impl<C: Connector> Reservation<'_, C> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<C: Connector> Drop for Reservation<'_, C> {
    fn drop(&mut self) {
        if self.armed {
            self.pool.forget(self.id);
        }
    }
}

// =============================================================================
// Pooled Connection
// =============================================================================

/// A checked-out connection.
///
/// Returned to the pool exactly once, when dropped.
pub struct PooledConnection<C: Connector> {
    pool: Arc<PoolInner<C>>,
    id: u64,
    conn: Option<C::Connection>,
}

impl<C: Connector> PooledConnection<C> {
    fn new(pool: Arc<PoolInner<C>>, id: u64, conn: C::Connection) -> Self {
        PooledConnection {
            pool,
            id,
            conn: Some(conn),
        }
    }

    /// Pool-local identifier of the underlying connection.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<C: Connector> Deref for PooledConnection<C> {
    type Target = C::Connection;

    fn deref(&self) -> &C::Connection {
        // Only `Drop` takes the connection out.
        match &self.conn {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl<C: Connector> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut C::Connection {
        match &mut self.conn {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl<C: Connector> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.give_back(self.id, conn);
        }
    }
}

impl<C: Connector> fmt::Debug for PooledConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection").field("id", &self.id).finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
