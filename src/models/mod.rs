//! Data models for the student tracker.

pub mod student;

pub use student::{NewStudent, Student, columns};
