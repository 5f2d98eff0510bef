//! # Error Types
//!
//! The classified failure taxonomy shared by every Stockroom crate.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── ClassifiedError   - code + category message + details + cause     │
//! │  │   ├── Argument   (1) - bad startup input / invalid caller data      │
//! │  │   ├── Storage    (2) - any fault while talking to the store         │
//! │  │   └── Cancelled  (3) - deadline hit while waiting on the store      │
//! │  └── ValidationError   - field-level input failures (→ Argument)       │
//! │                                                                         │
//! │  stockroom-db                                                           │
//! │  └── StoreFault        - driver fault kind, becomes Storage details    │
//! │                                                                         │
//! │  Flow: sqlx::Error → StoreFault → ClassifiedError::Storage → caller    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Full Message Format
//! ```text
//! [<code>] <category message>: <details>
//! <cause>
//! ```
//! The `: <details>` segment is omitted when there are no details, the
//! cause line when there is no cause.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Boxed low-level cause carried by storage failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// =============================================================================
// Classified Error
// =============================================================================

/// Where an operation was waiting when its deadline elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelStage {
    /// Waiting for a pooled connection to become free.
    AwaitingConnection,
    /// Waiting for the store to finish executing a statement.
    AwaitingStatement,
}

impl fmt::Display for CancelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelStage::AwaitingConnection => f.write_str("awaiting a pooled connection"),
            CancelStage::AwaitingStatement => f.write_str("awaiting statement completion"),
        }
    }
}

/// A classified failure.
///
/// Every variant exposes a stable [`code`](ClassifiedError::code), a fixed
/// category [`message`](ClassifiedError::message), optional
/// [`details`](ClassifiedError::details) and an optional
/// [`cause`](ClassifiedError::cause). `Display` prints the category message
/// only; use [`full_message`](ClassifiedError::full_message) for the
/// composed form.
#[derive(Debug, Error)]
pub enum ClassifiedError {
    /// Invalid caller-supplied configuration or input. Never retried.
    ///
    /// ## When This Occurs
    /// - Fewer than three startup arguments
    /// - Unparsable environment override
    /// - Product fields failing validation
    #[error("Incorrect CLI arguments")]
    Argument { details: String },

    /// Any failure while talking to the store.
    ///
    /// ## When This Occurs
    /// - Store unreachable or pool closed
    /// - Duplicate primary key
    /// - Malformed statement
    /// - Transaction begin/commit failure
    #[error("Data storage error")]
    Storage {
        /// Name of the failing operation, e.g. `ProductRepository::create`.
        operation: &'static str,
        /// Optional human-readable detail.
        details: Option<String>,
        /// Original low-level fault.
        #[source]
        cause: Option<BoxError>,
    },

    /// The operation gave up waiting on the pool or on the store.
    #[error("Operation cancelled")]
    Cancelled {
        operation: &'static str,
        stage: CancelStage,
    },
}

impl ClassifiedError {
    /// Code for [`ClassifiedError::Argument`].
    pub const ARGUMENT_CODE: i32 = 1;
    /// Code for [`ClassifiedError::Storage`].
    pub const STORAGE_CODE: i32 = 2;
    /// Code for [`ClassifiedError::Cancelled`].
    pub const CANCELLED_CODE: i32 = 3;

    /// Creates an argument error with the given details.
    pub fn argument(details: impl Into<String>) -> Self {
        ClassifiedError::Argument {
            details: details.into(),
        }
    }

    /// Creates a storage error wrapping a low-level cause.
    pub fn storage<E>(operation: &'static str, details: Option<String>, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        ClassifiedError::Storage {
            operation,
            details,
            cause: Some(cause.into()),
        }
    }

    /// Creates a storage error that has no underlying cause.
    pub fn storage_without_cause(operation: &'static str, details: impl Into<String>) -> Self {
        ClassifiedError::Storage {
            operation,
            details: Some(details.into()),
            cause: None,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(operation: &'static str, stage: CancelStage) -> Self {
        ClassifiedError::Cancelled { operation, stage }
    }

    /// Stable numeric code.
    pub fn code(&self) -> i32 {
        match self {
            ClassifiedError::Argument { .. } => Self::ARGUMENT_CODE,
            ClassifiedError::Storage { .. } => Self::STORAGE_CODE,
            ClassifiedError::Cancelled { .. } => Self::CANCELLED_CODE,
        }
    }

    /// Fixed category message.
    pub fn message(&self) -> &'static str {
        match self {
            ClassifiedError::Argument { .. } => "Incorrect CLI arguments",
            ClassifiedError::Storage { .. } => "Data storage error",
            ClassifiedError::Cancelled { .. } => "Operation cancelled",
        }
    }

    /// Contextual details.
    ///
    /// For storage faults this is the operation name, followed by the human
    /// detail when one exists. Empty details are reported as `None`.
    pub fn details(&self) -> Option<Cow<'_, str>> {
        let details = match self {
            ClassifiedError::Argument { details } => Cow::Borrowed(details.as_str()),
            ClassifiedError::Storage {
                operation,
                details: Some(detail),
                ..
            } if !detail.is_empty() => Cow::Owned(format!("{operation}: {detail}")),
            ClassifiedError::Storage { operation, .. } => Cow::Borrowed(*operation),
            ClassifiedError::Cancelled { operation, stage } => {
                Cow::Owned(format!("{operation}: {stage}"))
            }
        };

        if details.is_empty() {
            None
        } else {
            Some(details)
        }
    }

    /// Returns true if the error carries non-empty details.
    pub fn has_details(&self) -> bool {
        self.details().is_some()
    }

    /// The wrapped low-level fault, if any.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            ClassifiedError::Storage {
                cause: Some(cause), ..
            } => Some(&**cause),
            _ => None,
        }
    }

    /// Returns true if a low-level cause is attached.
    pub fn has_cause(&self) -> bool {
        self.cause().is_some()
    }

    /// Name of the failing operation, for storage and cancellation errors.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            ClassifiedError::Storage { operation, .. }
            | ClassifiedError::Cancelled { operation, .. } => Some(*operation),
            ClassifiedError::Argument { .. } => None,
        }
    }

    /// Composes `"[<code>] <message>: <details>\n<cause>"`.
    pub fn full_message(&self) -> String {
        let mut out = format!("[{}] {}", self.code(), self.message());

        if let Some(details) = self.details() {
            out.push_str(": ");
            out.push_str(&details);
        }

        if let Some(cause) = self.cause() {
            out.push('\n');
            out.push_str(&cause.to_string());
        }

        out
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation of user-entered products before they reach the
/// repository.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be a finite number.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Invalid format (e.g. a non-numeric id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl From<ValidationError> for ClassifiedError {
    fn from(err: ValidationError) -> Self {
        ClassifiedError::argument(err.to_string())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with ClassifiedError.
pub type CoreResult<T> = Result<T, ClassifiedError>;

// =============================================================================
// Unit Tests
// =============================================================================
