//! # Database Error Classification
//!
//! Translates driver errors into the shared [`ClassifiedError`] taxonomy.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ├── PoolTimedOut ──────────► ClassifiedError::Cancelled          │
//! │       │                              (awaiting a pooled connection)     │
//! │       ▼                                                                 │
//! │  StoreFault (this module) ← Categorization (duplicate id, ...)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ClassifiedError::Storage { operation, details, cause }                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Consumer displays full_message()                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The raw `sqlx::Error` never escapes this crate except as the `cause` of a
//! storage error.

use stockroom_core::{CancelStage, ClassifiedError};
use thiserror::Error;
use tracing::warn;

/// Result type for database operations.
pub type StoreResult<T> = Result<T, ClassifiedError>;

/// Category of a driver fault, used as the storage error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreFault {
    /// Primary key (or other unique constraint) violation.
    ///
    /// ## When This Occurs
    /// - `create` with an id that already exists
    /// - `create_batch` where any id collides
    /// - `update` moving a row onto an id that is taken
    #[error("duplicate id")]
    DuplicateKey,

    /// The store could not be reached or the pool is closed.
    #[error("connection failure")]
    ConnectionFailed,

    /// A result column could not be read into a `Product` field.
    #[error("column read failed")]
    ColumnRead,

    /// Beginning or committing a transaction failed.
    #[error("transaction failed")]
    TransactionFailed,

    /// The store rejected the statement.
    #[error("query failed")]
    QueryFailed,

    /// Anything else the driver reports.
    #[error("internal driver error")]
    Internal,
}

impl StoreFault {
    /// Categorizes a driver error.
    ///
    /// ## Error Mapping
    /// ```text
    /// Database (unique violation)       → DuplicateKey
    /// Database (other)                  → QueryFailed
    /// Io / Tls / Protocol / PoolClosed  → ConnectionFailed
    /// Configuration / WorkerCrashed     → ConnectionFailed
    /// ColumnDecode / ColumnNotFound     → ColumnRead
    /// Other                             → Internal
    /// ```
    pub fn classify(err: &sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                // SQLite reports "UNIQUE constraint failed: products.id"
                if db_err.is_unique_violation()
                    || db_err.message().contains("UNIQUE constraint failed")
                {
                    StoreFault::DuplicateKey
                } else {
                    StoreFault::QueryFailed
                }
            }

            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_)
            | sqlx::Error::WorkerCrashed => StoreFault::ConnectionFailed,

            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::Decode(_) => StoreFault::ColumnRead,

            _ => StoreFault::Internal,
        }
    }
}

/// Wraps a driver error raised by `operation`.
pub(crate) fn storage_error(operation: &'static str, err: sqlx::Error) -> ClassifiedError {
    classify_with(operation, err, StoreFault::classify)
}

/// Wraps a driver error raised while beginning or committing a transaction.
///
/// Constraint and connectivity faults keep their own category; anything
/// else is reported as a transaction failure.
pub(crate) fn transaction_error(operation: &'static str, err: sqlx::Error) -> ClassifiedError {
    classify_with(operation, err, |err| match StoreFault::classify(err) {
        fault @ (StoreFault::DuplicateKey | StoreFault::ConnectionFailed) => fault,
        _ => StoreFault::TransactionFailed,
    })
}

fn classify_with(
    operation: &'static str,
    err: sqlx::Error,
    classify: impl FnOnce(&sqlx::Error) -> StoreFault,
) -> ClassifiedError {
    if let sqlx::Error::PoolTimedOut = err {
        warn!(operation, "Timed out waiting for a pooled connection");
        return ClassifiedError::cancelled(operation, CancelStage::AwaitingConnection);
    }

    let fault = classify(&err);
    warn!(operation, fault = %fault, error = %err, "Store operation failed");
    ClassifiedError::storage(operation, Some(fault.to_string()), err)
}

// =============================================================================
// Unit Tests
// =============================================================================
