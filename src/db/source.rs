//! Connection source abstraction.
//!
//! The store talks to the backend only through these traits: a source hands
//! out connections, a connection prepares statements and runs them, a query
//! yields a cursor of rows. Every handle implements [`Release`] so the store
//! can wrap it in a [`Scoped`](crate::db::Scoped) guard.
//!
//! The production implementation lives in [`crate::db::pool`]; tests drive the
//! store with an in-memory fake that records every open and close.

use crate::error::StoreResult;
use async_trait::async_trait;

/// A positional parameter bound to a prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

impl SqlParam {
    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Text(_) => "text",
        }
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// How a backend's `lower()` folds text, so search terms can be folded to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFolding {
    /// Every cased letter is lowered.
    #[default]
    Unicode,
    /// Only `A`-`Z` are lowered; other letters compare as written (SQLite).
    Ascii,
}

impl CaseFolding {
    pub fn fold(self, text: &str) -> String {
        match self {
            Self::Unicode => text.to_lowercase(),
            Self::Ascii => text.to_ascii_lowercase(),
        }
    }
}

/// A handle that must be given back when an operation ends.
pub trait Release {
    /// Short name used in diagnostics ("connection", "statement", "cursor").
    const KIND: &'static str;

    /// Give the handle back. Called exactly once, from the scoped guard.
    fn release(&mut self) -> StoreResult<()>;
}

/// Supplies connections on request. Shared by every store operation.
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    type Connection: StoreConnection;

    /// Check out a connection. Failures are reported as `StoreError::Connection`.
    async fn acquire(&self) -> StoreResult<Self::Connection>;
}

/// A checked-out connection.
#[async_trait]
pub trait StoreConnection: Release + Send {
    type Statement: StoreStatement;
    type Cursor: RowCursor;

    /// Case folding applied by this backend's `lower()`.
    fn case_folding(&self) -> CaseFolding {
        CaseFolding::Unicode
    }

    /// Prepare a statement from fixed SQL text with `?` placeholders.
    fn prepare(&mut self, sql: &str) -> StoreResult<Self::Statement>;

    /// Run a statement that returns rows.
    async fn query(&mut self, statement: &Self::Statement) -> StoreResult<Self::Cursor>;

    /// Run a statement that changes rows and return the affected count.
    async fn execute(&mut self, statement: &Self::Statement) -> StoreResult<u64>;
}

/// A prepared statement awaiting its parameters.
pub trait StoreStatement: Release + Send + Sync {
    /// Bind the next positional parameter.
    fn bind(&mut self, param: SqlParam);
}

/// A forward-only cursor over query results.
#[async_trait]
pub trait RowCursor: Release + Send {
    type Row: ColumnAccess + Send;

    async fn next_row(&mut self) -> StoreResult<Option<Self::Row>>;
}

/// Typed access to the columns of one result row.
pub trait ColumnAccess {
    fn get_i64(&self, column: &str) -> StoreResult<i64>;
    fn get_text(&self, column: &str) -> StoreResult<String>;
}
