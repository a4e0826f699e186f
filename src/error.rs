//! Error types for the student store.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! The store never recovers from these locally; the session orchestrator turns them
//! into a user-facing message.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The pool could not supply a usable connection.
    #[error("Connection failed: {message}")]
    Connection { message: String },

    /// The backend rejected or failed to execute a statement.
    #[error("Query failed: {message}")]
    Query {
        message: String,
        /// e.g., "23505" for a unique violation
        sql_state: Option<String>,
    },

    #[error("Could not read column '{column}': {message}")]
    Mapping { column: String, message: String },

    #[error("Could not find student id: {id}")]
    NotFound { id: i64 },
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with optional SQL state.
    pub fn query(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a row mapping error.
    pub fn mapping(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    /// True for a lookup that matched no rows.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for failures of the pool or backend (the umbrella "store" failures).
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Query { .. })
    }
}

/// Classify sqlx errors raised while running a statement.
///
/// Errors raised while checking out a connection are mapped with
/// [`StoreError::connection`] at the acquire site instead.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                StoreError::query(db_err.message(), code)
            }
            sqlx::Error::Configuration(msg) => StoreError::connection(msg.to_string()),
            sqlx::Error::PoolTimedOut => {
                StoreError::connection("Timed out waiting for a pooled connection")
            }
            sqlx::Error::PoolClosed => StoreError::connection("Connection pool is closed"),
            sqlx::Error::Io(io_err) => StoreError::connection(format!("I/O error: {}", io_err)),
            sqlx::Error::Tls(tls_err) => StoreError::connection(format!("TLS error: {}", tls_err)),
            sqlx::Error::Protocol(msg) => StoreError::query(format!("Protocol error: {}", msg), None),
            sqlx::Error::ColumnNotFound(col) => StoreError::mapping(col, "column not found"),
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::mapping(index, source.to_string())
            }
            sqlx::Error::Decode(source) => StoreError::mapping("?", source.to_string()),
            sqlx::Error::RowNotFound => StoreError::query("No rows returned", None),
            _ => StoreError::query(format!("Unknown database error: {}", err), None),
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
