//! # Database Error Types
//!
//! Error types for pool, executor and repository operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL error (sqlx::Error, SQLSTATE)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← classified by SQLSTATE                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError (request handler) ← mapped to tonic::Status               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## SQLSTATE Classification
//! | SQLSTATE | Variant                      |
//! |----------|------------------------------|
//! | 23505    | [`DbError::UniqueViolation`]     |
//! | 23503    | [`DbError::ForeignKeyViolation`] |
//! | 23502    | [`DbError::NotNullViolation`]    |
//! | other    | [`DbError::QueryFailed`]         |

use gameworld_core::ValidationError;
use thiserror::Error;

/// SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for `foreign_key_violation`.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE for `not_null_violation`.
pub const NOT_NULL_VIOLATION: &str = "23502";
/// SQLSTATE for `undefined_table`.
pub const UNDEFINED_TABLE: &str = "42P01";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The entity failed validation; nothing was sent to the store.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Unique constraint violation (SQLSTATE 23505).
    ///
    /// ## When This Occurs
    /// - Creating an object with a caller-supplied id that already exists
    #[error("Unique violation on {constraint}: {message}")]
    UniqueViolation { constraint: String, message: String },

    /// Foreign key constraint violation (SQLSTATE 23503).
    ///
    /// ## When This Occurs
    /// - `parent_id` references an object that does not exist
    /// - Purging an object that still has children
    #[error("Foreign key violation on {constraint}: {message}")]
    ForeignKeyViolation { constraint: String, message: String },

    /// Not-null constraint violation (SQLSTATE 23502).
    #[error("Not-null violation: {message}")]
    NotNullViolation { message: String },

    /// The store could not be reached, or the connection dropped mid-query.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other statement failure reported by the store.
    #[error("Query failed [{code}]: {message}")]
    QueryFailed { code: String, message: String },

    /// No connection became available before the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// The pool was closed.
    #[error("Connection pool is closed")]
    PoolClosed,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// True for failures that leave the connection unusable.
    ///
    /// The executor marks the connection broken so the pool discards it
    /// instead of handing it to the next caller.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_))
    }

    /// True for the constraint-violation family.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::NotNullViolation { .. }
        )
    }

    /// True when the statement referenced a relation that does not exist.
    pub fn is_undefined_table(&self) -> bool {
        matches!(self, DbError::QueryFailed { code, .. } if code == UNDEFINED_TABLE)
    }

    /// Classifies a store error by SQLSTATE.
    pub fn from_sqlstate(code: &str, constraint: Option<&str>, message: &str) -> Self {
        let constraint = constraint.unwrap_or("unknown").to_string();
        let message = message.to_string();
        match code {
            UNIQUE_VIOLATION => DbError::UniqueViolation { constraint, message },
            FOREIGN_KEY_VIOLATION => DbError::ForeignKeyViolation { constraint, message },
            NOT_NULL_VIOLATION => DbError::NotNullViolation { message },
            _ => DbError::QueryFailed {
                code: code.to_string(),
                message,
            },
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database        → by SQLSTATE (see module docs)
/// sqlx::Error::Io / Tls / ...  → DbError::ConnectionFailed
/// sqlx::Error::PoolTimedOut    → DbError::PoolExhausted
/// sqlx::Error::PoolClosed      → DbError::PoolClosed
/// Other                        → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                DbError::from_sqlstate(&code, db_err.constraint(), db_err.message())
            }

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),
            sqlx::Error::Tls(e) => DbError::ConnectionFailed(e.to_string()),
            sqlx::Error::Protocol(msg) => DbError::ConnectionFailed(msg),

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::PoolClosed,

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Internal(format!("JSON encoding failed: {}", err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
