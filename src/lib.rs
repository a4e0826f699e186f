//! Student Tracker Library
//!
//! This library provides a record store for student records kept in a SQL
//! database (SQLite, PostgreSQL, MySQL) and a per-session orchestrator that
//! drives it on behalf of a presentation layer.

pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod models;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use models::{NewStudent, Student};
pub use session::{Navigation, StudentSession};
pub use store::StudentStore;
