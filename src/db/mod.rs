//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - The connection source traits the store is written against
//! - Scoped release of connection, statement and cursor handles
//! - The sqlx-backed connection pool
//! - Parameter binding

pub mod params;
pub mod pool;
pub mod scoped;
pub mod source;

pub use pool::{DbPool, SqlxConnection, SqlxCursor, SqlxRow, SqlxSource, SqlxStatement};
pub use scoped::Scoped;
pub use source::{
    CaseFolding, ColumnAccess, ConnectionSource, Release, RowCursor, SqlParam,
    StoreConnection, StoreStatement,
};
