//! Student record store.
//!
//! All backend reads and writes for student records go through [`StudentStore`].
//! Every operation checks out one connection, prepares one fixed statement,
//! binds its inputs positionally and releases cursor, statement and connection
//! before returning, whatever the outcome.

use crate::db::{
    CaseFolding, ConnectionSource, RowCursor, Scoped, SqlParam, StoreConnection, StoreStatement,
};
use crate::error::{StoreError, StoreResult};
use crate::models::{NewStudent, Student};
use std::sync::Arc;
use tracing::{debug, info};

/// The fixed SQL text issued by the store. Inputs are only ever bound.
pub mod queries {
    pub const LIST: &str = "select * from student order by last_name";
    pub const SEARCH: &str = "select * from student where lower(first_name) like ? or lower(last_name) like ? order by last_name";
    pub const GET: &str = "select * from student where id=?";
    pub const INSERT: &str = "insert into student (first_name, last_name, email) values (?, ?, ?)";
    pub const UPDATE: &str = "update student set first_name=?, last_name=?, email=? where id=?";
    pub const DELETE: &str = "delete from student where id=?";
}

/// Build the `like` pattern for a name search, folded the way the backend's
/// `lower()` folds the name columns.
pub fn search_pattern(term: &str, folding: CaseFolding) -> String {
    format!("%{}%", folding.fold(term))
}

/// Data access for the `student` table.
///
/// Holds nothing but a shared handle to its connection source, so one store can
/// serve many sessions at once.
pub struct StudentStore<S> {
    source: Arc<S>,
}

impl<S> Clone for StudentStore<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: ConnectionSource> StudentStore<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// All students, ordered by last name.
    pub async fn list_all(&self) -> StoreResult<Vec<Student>> {
        self.fetch(queries::LIST, |_| Vec::new(), None).await
    }

    /// Students whose first or last name contains `term`, ignoring case,
    /// ordered by last name. A blank term lists everyone.
    pub async fn search(&self, term: &str) -> StoreResult<Vec<Student>> {
        if term.trim().is_empty() {
            return self.list_all().await;
        }

        self.fetch(
            queries::SEARCH,
            |folding| {
                let pattern = search_pattern(term, folding);
                vec![SqlParam::from(pattern.clone()), SqlParam::from(pattern)]
            },
            None,
        )
        .await
    }

    /// Look up one student. Fails with `NotFound` when the id is unknown.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Student> {
        self.fetch(queries::GET, |_| vec![SqlParam::Int(id)], Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(id))
    }

    /// Insert a new student. The backend assigns the id, which is not returned.
    pub async fn create(&self, student: &NewStudent) -> StoreResult<()> {
        let rows = self
            .execute(
                queries::INSERT,
                vec![
                    SqlParam::from(student.first_name.as_str()),
                    SqlParam::from(student.last_name.as_str()),
                    SqlParam::from(student.email.as_str()),
                ],
            )
            .await?;
        info!(rows_affected = rows, "Student created");
        Ok(())
    }

    /// Replace all fields of an existing student.
    ///
    /// Fails with `NotFound` when no row has the student's id.
    pub async fn update(&self, student: &Student) -> StoreResult<()> {
        let rows = self
            .execute(
                queries::UPDATE,
                vec![
                    SqlParam::from(student.first_name.as_str()),
                    SqlParam::from(student.last_name.as_str()),
                    SqlParam::from(student.email.as_str()),
                    SqlParam::Int(student.id),
                ],
            )
            .await?;
        if rows == 0 {
            return Err(StoreError::not_found(student.id));
        }
        info!(id = student.id, "Student updated");
        Ok(())
    }

    /// Delete a student. Fails with `NotFound` when no row has the id.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let rows = self
            .execute(queries::DELETE, vec![SqlParam::Int(id)])
            .await?;
        if rows == 0 {
            return Err(StoreError::not_found(id));
        }
        info!(id, "Student deleted");
        Ok(())
    }

    /// Run a row-returning statement and map up to `limit` rows.
    ///
    /// `params` is called once a connection is checked out, with that
    /// connection's case folding.
    async fn fetch<F>(&self, sql: &str, params: F, limit: Option<usize>) -> StoreResult<Vec<Student>>
    where
        F: FnOnce(CaseFolding) -> Vec<SqlParam> + Send,
    {
        let mut conn = Scoped::new(self.source.acquire().await?);
        let mut statement = Scoped::new(conn.prepare(sql)?);
        for param in params(conn.case_folding()) {
            statement.bind(param);
        }
        let mut cursor = Scoped::new(conn.query(&statement).await?);

        let mut students = Vec::new();
        while limit.is_none_or(|l| students.len() < l) {
            let Some(row) = cursor.next_row().await? else {
                break;
            };
            students.push(Student::from_row(&row)?);
        }

        debug!(sql, rows = students.len(), "Fetched students");
        Ok(students)
    }

    /// Run a row-changing statement and return the affected count.
    async fn execute(&self, sql: &str, params: Vec<SqlParam>) -> StoreResult<u64> {
        let mut conn = Scoped::new(self.source.acquire().await?);
        let mut statement = Scoped::new(conn.prepare(sql)?);
        for param in params {
            statement.bind(param);
        }
        let rows = conn.execute(&statement).await?;
        debug!(sql, rows_affected = rows, "Executed statement");
        Ok(rows)
    }
}
