//! # Connection Pool
//!
//! Bounded pool of live store connections with scoped checkout.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Connection Pool                                    │
//! │                                                                         │
//! │  Process startup                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PoolConfig::new(url) ← Configure ceiling, deadlines                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ConnectionPool::connect(config).await                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections, 20)    │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ acquire(operation) → ConnectionHandle (exclusive)              │
//! │       ▼                                                                 │
//! │  Repository call ──► statement(s) ──► handle dropped ──► back to pool  │
//! │                                                                         │
//! │  Callers beyond the ceiling wait; the wait ends with a handle or,      │
//! │  after acquire_timeout, with ClassifiedError::Cancelled.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scoped Acquisition
//! A `ConnectionHandle` returns its connection to the pool when dropped, so
//! every exit path (success, classified error, `?` propagation, panic
//! unwinding, future cancellation) releases it. Only the repository and the
//! schema bootstrap check connections out.
//!
//! ## Statement Deadlines
//! With a `statement_timeout` set, every checkout installs a SQLite progress
//! handler tied to the handle's interrupt switch. When the deadline fires the
//! interrupt is tripped and the statement aborts on the worker, so the
//! connection is idle again before it goes back to the pool.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
    SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool};
use stockroom_core::{
    CancelStage, ClassifiedError, StoreConfig, DEFAULT_MAX_CONNECTIONS,
};
use tracing::{debug, info, trace, warn};

use crate::error::{storage_error, StoreResult};
use crate::repository::product::ProductRepository;

/// VM instructions between progress handler calls.
const PROGRESS_HANDLER_OPS: i32 = 1_000;

// =============================================================================
// Configuration
// =============================================================================

/// Pool configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = PoolConfig::new("sqlite://./stockroom.db")
///     .credentials("admin", "secret")
///     .max_connections(10)
///     .statement_timeout(Some(Duration::from_secs(5)));
/// ```
#[derive(Clone)]
pub struct PoolConfig {
    /// Store endpoint URL.
    pub url: String,

    pub username: String,

    pub password: String,

    /// Ceiling on concurrently open connections.
    /// Default: 20
    pub max_connections: u32,

    /// Connections kept open while idle.
    /// Default: 1
    pub min_connections: u32,

    /// How long a caller may wait for a free connection before the wait is
    /// reported as a cancellation.
    /// Default: 30 seconds
    pub acquire_timeout: Duration,

    /// How long a single statement may run before it is abandoned.
    /// Default: unlimited
    pub statement_timeout: Option<Duration>,

    /// Idle time before a surplus connection is closed.
    /// Default: 10 minutes
    pub idle_timeout: Duration,
}

impl PoolConfig {
    /// Creates a configuration for the given endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        PoolConfig {
            url: url.into(),
            username: String::new(),
            password: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            statement_timeout: None,
            idle_timeout: Duration::from_secs(600),
        }
    }

    /// Sets the store credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection wait deadline.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Sets the per-statement deadline (`None` waits indefinitely).
    pub fn statement_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Creates an in-memory store configuration (for testing).
    ///
    /// Each call yields a separate, isolated database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let pool = ConnectionPool::connect(PoolConfig::in_memory()).await?;
    /// ```
    pub fn in_memory() -> Self {
        PoolConfig {
            url: "sqlite::memory:".to_string(),
            username: String::new(),
            password: String::new(),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: None,
            idle_timeout: Duration::from_secs(60),
        }
    }

    fn validate(&self) -> StoreResult<()> {
        if self.max_connections == 0 {
            return Err(ClassifiedError::argument(
                "max_connections must be at least 1",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ClassifiedError::argument(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }

        Ok(())
    }
}

impl From<&StoreConfig> for PoolConfig {
    fn from(config: &StoreConfig) -> Self {
        PoolConfig::new(config.db_url.clone()).credentials(&config.db_user, &config.db_pass)
    }
}

impl std::fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("statement_timeout", &self.statement_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

// =============================================================================
// Pool
// =============================================================================

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub max_connections: u32,
    /// Connections currently open (idle or checked out).
    pub open: u32,
    pub idle: usize,
    /// Handles currently held by callers.
    pub checked_out: usize,
}

/// Process-wide pool of store connections.
///
/// Cloning is cheap and shares the same underlying pool; hand a clone to
/// each repository rather than storing the pool in global state.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    pool: SqlitePool,
    checked_out: Arc<AtomicUsize>,
    max_connections: u32,
    statement_timeout: Option<Duration>,
}

impl ConnectionPool {
    /// Creates the pool and opens the initial connections.
    ///
    /// ## What This Does
    /// 1. Validates the ceiling settings
    /// 2. Configures SQLite (WAL journal, NORMAL synchronous)
    /// 3. Creates the database file if it doesn't exist
    /// 4. Opens `min_connections` connections
    ///
    /// ## Returns
    /// * `Ok(ConnectionPool)` - Ready-to-use pool
    /// * `Err(ClassifiedError::Argument)` - Invalid ceiling settings
    /// * `Err(ClassifiedError::Storage)` - Store unreachable or bad URL
    pub async fn connect(config: PoolConfig) -> StoreResult<Self> {
        const OPERATION: &str = "ConnectionPool::connect";

        config.validate()?;

        info!(
            url = %config.url,
            user = %config.username,
            max_connections = config.max_connections,
            "Initializing store connection pool"
        );

        if !config.username.is_empty() {
            // SQLite has no authentication
            debug!("Credentials are not applied by the SQLite backend");
        }

        let connect_options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| storage_error(OPERATION, e))?
            // WAL mode: readers don't block writers
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| storage_error(OPERATION, e))?;

        info!(
            max_connections = config.max_connections,
            "Store connection pool created"
        );

        Ok(ConnectionPool {
            pool,
            checked_out: Arc::new(AtomicUsize::new(0)),
            max_connections: config.max_connections,
            statement_timeout: config.statement_timeout,
        })
    }

    /// Checks out a connection for exclusive use by `operation`.
    ///
    /// Waits while all connections are in use. The returned handle goes back
    /// to the pool when dropped.
    ///
    /// ## Returns
    /// * `Ok(ConnectionHandle)` - Exclusive connection
    /// * `Err(ClassifiedError::Cancelled)` - Waited longer than `acquire_timeout`
    /// * `Err(ClassifiedError::Storage)` - Store unreachable or pool closed
    pub(crate) async fn acquire(&self, operation: &'static str) -> StoreResult<ConnectionHandle> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| storage_error(operation, e))?;

        let interrupt = Interrupt::default();
        if self.statement_timeout.is_some() {
            // Replaces the handler left by the previous holder
            let tripped = interrupt.clone();
            conn.lock_handle()
                .await
                .map_err(|e| storage_error(operation, e))?
                .set_progress_handler(PROGRESS_HANDLER_OPS, move || !tripped.is_tripped());
        }

        let in_use = self.checked_out.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(operation, in_use, "Connection checked out");

        Ok(ConnectionHandle {
            conn,
            operation,
            interrupt,
            checked_out: Arc::clone(&self.checked_out),
        })
    }

    /// Awaits a statement under the configured statement deadline.
    ///
    /// `interrupt` comes from the handle the statement runs on. Driver errors
    /// are classified as storage faults of `operation`.
    ///
    /// ```rust,ignore
    /// let mut conn = pool.acquire(OPERATION).await?;
    /// pool.run(conn.interrupt(), OPERATION, query.execute(&mut *conn)).await?;
    /// ```
    pub(crate) async fn run<T, F>(
        &self,
        interrupt: Interrupt,
        operation: &'static str,
        statement: F,
    ) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        self.run_mapped(interrupt, operation, statement, storage_error)
            .await
    }

    /// Like [`run`](Self::run) with a custom driver error mapping.
    pub(crate) async fn run_mapped<T, F>(
        &self,
        interrupt: Interrupt,
        operation: &'static str,
        statement: F,
        map_err: fn(&'static str, sqlx::Error) -> ClassifiedError,
    ) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let outcome = match self.statement_timeout {
            Some(limit) => tokio::time::timeout(limit, statement).await.map_err(|_| {
                // The worker aborts the statement at its next progress check
                interrupt.trip();
                warn!(operation, ?limit, "Statement deadline elapsed, interrupting");
                ClassifiedError::cancelled(operation, CancelStage::AwaitingStatement)
            })?,
            None => statement.await,
        };

        outcome.map_err(|e| map_err(operation, e))
    }

    /// Returns the number of handles currently held by callers.
    pub fn checked_out(&self) -> usize {
        self.checked_out.load(Ordering::SeqCst)
    }

    /// Returns a snapshot of pool occupancy.
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            max_connections: self.max_connections,
            open: self.pool.size(),
            idle: self.pool.num_idle(),
            checked_out: self.checked_out(),
        }
    }

    /// Returns the product repository backed by this pool.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.clone())
    }

    /// Checks if the store is responsive.
    pub async fn health_check(&self) -> bool {
        let Ok(mut conn) = self.acquire("ConnectionPool::health_check").await else {
            return false;
        };

        sqlx::query("SELECT 1").execute(&mut *conn).await.is_ok()
    }

    /// Closes the pool.
    ///
    /// Waits for checked-out handles to be returned. After this, every
    /// acquire fails with a storage error.
    pub async fn close(&self) {
        info!("Closing store connection pool");
        self.pool.close().await;
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

// =============================================================================
// Connection Handle
// =============================================================================

/// Abort switch read by a connection's progress handler.
#[derive(Debug, Clone, Default)]
pub(crate) struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    fn trip(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn is_tripped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Exclusive, short-lived ownership of one pooled connection.
///
/// Derefs to the underlying [`SqliteConnection`]. Dropping the handle returns
/// the connection to the pool.
pub(crate) struct ConnectionHandle {
    conn: PoolConnection<Sqlite>,
    operation: &'static str,
    interrupt: Interrupt,
    checked_out: Arc<AtomicUsize>,
}

impl ConnectionHandle {
    /// The operation this handle was checked out for.
    pub(crate) fn operation(&self) -> &'static str {
        self.operation
    }

    /// Interrupt for statements run on this handle.
    pub(crate) fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }
}

impl Deref for ConnectionHandle {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for ConnectionHandle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        let in_use = self.checked_out.fetch_sub(1, Ordering::SeqCst) - 1;
        trace!(operation = self.operation(), in_use, "Connection released");
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
