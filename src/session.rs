//! Per-session orchestration of student operations.
//!
//! A [`StudentSession`] holds the state one user's screen needs between
//! requests: the last loaded list, a search filter waiting to be applied, and
//! the last error message. It calls into the [`StudentStore`] and turns every
//! store failure into an error message plus [`Navigation::Stay`]; callers never
//! see a raised error.
//!
//! # Concurrency
//!
//! All transitions take `&mut self`, so a session serves one request at a
//! time. The session is `Send` when its connection source is, but it does no
//! locking of its own; wrap it in a mutex to share it between tasks. The store
//! inside is shared freely.

use crate::db::ConnectionSource;
use crate::error::StoreError;
use crate::models::{NewStudent, Student};
use crate::store::StudentStore;
use std::collections::HashSet;
use tracing::{error, info, warn};

/// Where the presentation layer should go after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Return to the list; the caller is expected to trigger a load.
    ListStudents,
    /// Show the edit form for this record.
    EditForm(Student),
    /// Stay on the current page; an error message is waiting.
    Stay,
}

/// One user's view of the student records: loaded results, pending filter and last error.
pub struct StudentSession<S> {
    store: StudentStore<S>,
    results: Vec<Student>,
    pending_filter: Option<String>,
    last_error: Option<String>,
}

impl<S: ConnectionSource> StudentSession<S> {
    pub fn new(store: StudentStore<S>) -> Self {
        Self {
            store,
            results: Vec::new(),
            pending_filter: None,
            last_error: None,
        }
    }

    /// The last successfully loaded students.
    pub fn results(&self) -> &[Student] {
        &self.results
    }

    /// Set the name filter applied by the next [`trigger_load`](Self::trigger_load).
    pub fn set_pending_filter(&mut self, filter: impl Into<String>) {
        self.pending_filter = Some(filter.into());
    }

    pub fn pending_filter(&self) -> Option<&str> {
        self.pending_filter.as_deref()
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    /// Take the pending error message, leaving none behind.
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// Load students, applying and then discarding the pending filter.
    ///
    /// On failure the previous results stay in place and an error is recorded.
    pub async fn trigger_load(&mut self) {
        // Taken up front so the filter is gone whatever happens below.
        let filter = self.pending_filter.take();
        info!(filter = ?filter, "Loading students");

        let result = match filter.as_deref() {
            Some(term) if !term.trim().is_empty() => self.store.search(term).await,
            _ => self.store.list_all().await,
        };

        match result {
            Ok(mut students) => {
                let mut seen = HashSet::new();
                let before = students.len();
                students.retain(|s| seen.insert(s.id));
                if students.len() != before {
                    warn!(
                        dropped = before - students.len(),
                        "Dropped students with duplicate ids"
                    );
                }
                self.results = students;
                self.last_error = None;
            }
            Err(e) => {
                error!(error = %e, "Error loading students");
                self.record_error(&e);
            }
        }
    }

    pub async fn trigger_create(&mut self, student: &NewStudent) -> Navigation {
        info!(student = %student, "Adding student");
        match self.store.create(student).await {
            Ok(()) => Navigation::ListStudents,
            Err(e) => {
                error!(error = %e, student = %student, "Error adding student");
                self.fail(&e)
            }
        }
    }

    /// Fetch a student for the edit form.
    pub async fn trigger_prepare_edit(&mut self, id: i64) -> Navigation {
        info!(id, "Loading student");
        match self.store.get_by_id(id).await {
            Ok(student) => Navigation::EditForm(student),
            Err(e) => {
                error!(error = %e, id, "Error loading student");
                self.fail(&e)
            }
        }
    }

    pub async fn trigger_update(&mut self, student: &Student) -> Navigation {
        info!(student = %student, "Updating student");
        match self.store.update(student).await {
            Ok(()) => Navigation::ListStudents,
            Err(e) => {
                error!(error = %e, student = %student, "Error updating student");
                self.fail(&e)
            }
        }
    }

    pub async fn trigger_delete(&mut self, id: i64) -> Navigation {
        info!(id, "Deleting student");
        match self.store.delete(id).await {
            Ok(()) => Navigation::ListStudents,
            Err(e) => {
                error!(error = %e, id, "Error deleting student");
                self.fail(&e)
            }
        }
    }

    fn fail(&mut self, err: &StoreError) -> Navigation {
        self.record_error(err);
        Navigation::Stay
    }

    fn record_error(&mut self, err: &StoreError) {
        self.last_error = Some(format!("Error: {}", err));
    }
}
