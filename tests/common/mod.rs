//! In-memory connection source for driving the store without a database.
//!
//! The fake does not interpret SQL. It serves configured rows and affected
//! counts, fails at configured points, and records every handle it opens and
//! closes so tests can check that each handle is released exactly once.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use student_tracker::db::{
    CaseFolding, ColumnAccess, ConnectionSource, Release, RowCursor, SqlParam, StoreConnection,
    StoreStatement,
};
use student_tracker::{StoreError, StoreResult, Student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    Acquire,
    Prepare,
    Query,
    Execute,
    NextRow,
    ReleaseConnection,
    ReleaseStatement,
    ReleaseCursor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened(&'static str, usize),
    Closed(&'static str, usize),
    Prepared(String),
    Bound(SqlParam),
}

/// One row; `None` stands for SQL NULL.
#[derive(Debug, Clone, Default)]
pub struct FakeRow(pub HashMap<String, Option<String>>);

impl FakeRow {
    pub fn from_student(s: &Student) -> Self {
        Self(HashMap::from([
            ("id".to_string(), Some(s.id.to_string())),
            ("first_name".to_string(), Some(s.first_name.clone())),
            ("last_name".to_string(), Some(s.last_name.clone())),
            ("email".to_string(), Some(s.email.clone())),
        ]))
    }

    pub fn with_null(mut self, column: &str) -> Self {
        self.0.insert(column.to_string(), None);
        self
    }
}

impl ColumnAccess for FakeRow {
    fn get_i64(&self, column: &str) -> StoreResult<i64> {
        self.get_text(column)?
            .parse()
            .map_err(|e: std::num::ParseIntError| StoreError::mapping(column, e.to_string()))
    }

    fn get_text(&self, column: &str) -> StoreResult<String> {
        match self.0.get(column) {
            Some(Some(v)) => Ok(v.clone()),
            Some(None) => Err(StoreError::mapping(column, "unexpected NULL")),
            None => Err(StoreError::mapping(column, "column not found")),
        }
    }
}

#[derive(Default)]
struct FakeState {
    events: Vec<Event>,
    next_handle: usize,
    rows: Vec<FakeRow>,
    rows_affected: u64,
    failures: HashSet<Failure>,
    case_folding: CaseFolding,
}

impl FakeState {
    fn open(&mut self, kind: &'static str) -> usize {
        self.next_handle += 1;
        self.events.push(Event::Opened(kind, self.next_handle));
        self.next_handle
    }

    fn check(&self, failure: Failure) -> StoreResult<()> {
        if !self.failures.contains(&failure) {
            return Ok(());
        }
        Err(match failure {
            Failure::Acquire | Failure::ReleaseConnection => {
                StoreError::connection(format!("simulated {:?} failure", failure))
            }
            _ => StoreError::query(format!("simulated {:?} failure", failure), None),
        })
    }
}

type Shared = Arc<Mutex<FakeState>>;

#[derive(Clone, Default)]
pub struct FakeSource {
    state: Shared,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_students(students: &[Student]) -> Self {
        let source = Self::new();
        source.set_students(students);
        source
    }

    pub fn set_students(&self, students: &[Student]) {
        self.set_rows(students.iter().map(FakeRow::from_student).collect());
    }

    pub fn set_rows(&self, rows: Vec<FakeRow>) {
        self.state.lock().unwrap().rows = rows;
    }

    pub fn set_rows_affected(&self, n: u64) {
        self.state.lock().unwrap().rows_affected = n;
    }

    pub fn set_case_folding(&self, folding: CaseFolding) {
        self.state.lock().unwrap().case_folding = folding;
    }

    pub fn fail(&self, failure: Failure) {
        self.state.lock().unwrap().failures.insert(failure);
    }

    pub fn heal(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.lock().unwrap().events.clear();
    }

    pub fn prepared_sql(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Prepared(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn bound_params(&self) -> Vec<SqlParam> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Bound(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Kinds of handles in the order they were closed.
    pub fn close_order(&self) -> Vec<&'static str> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Closed(kind, _) => Some(kind),
                _ => None,
            })
            .collect()
    }

    pub fn opened_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Opened(..)))
            .count()
    }

    /// Panics unless every opened handle was closed exactly once, after it
    /// was opened, and nothing unopened was closed.
    pub fn assert_all_closed_once(&self) {
        let events = self.events();
        let mut open: HashMap<usize, &'static str> = HashMap::new();
        let mut closed: HashSet<usize> = HashSet::new();
        for event in &events {
            match event {
                Event::Opened(kind, id) => {
                    open.insert(*id, *kind);
                }
                Event::Closed(kind, id) => {
                    assert_eq!(open.get(id), Some(kind), "closed unopened {kind} {id}");
                    assert!(closed.insert(*id), "{kind} {id} closed twice");
                }
                _ => {}
            }
        }
        let leaked: Vec<_> = open.iter().filter(|(id, _)| !closed.contains(id)).collect();
        assert!(leaked.is_empty(), "leaked handles: {leaked:?}");
    }
}

#[async_trait]
impl ConnectionSource for FakeSource {
    type Connection = FakeConnection;

    async fn acquire(&self) -> StoreResult<FakeConnection> {
        let mut state = self.state.lock().unwrap();
        state.check(Failure::Acquire)?;
        let id = state.open(FakeConnection::KIND);
        Ok(FakeConnection {
            id,
            state: Arc::clone(&self.state),
        })
    }
}

pub struct FakeConnection {
    id: usize,
    state: Shared,
}

impl Release for FakeConnection {
    const KIND: &'static str = "connection";

    fn release(&mut self) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Closed(Self::KIND, self.id));
        state.check(Failure::ReleaseConnection)
    }
}

#[async_trait]
impl StoreConnection for FakeConnection {
    type Statement = FakeStatement;
    type Cursor = FakeCursor;

    fn case_folding(&self) -> CaseFolding {
        self.state.lock().unwrap().case_folding
    }

    fn prepare(&mut self, sql: &str) -> StoreResult<FakeStatement> {
        let mut state = self.state.lock().unwrap();
        state.check(Failure::Prepare)?;
        state.events.push(Event::Prepared(sql.to_string()));
        let id = state.open(FakeStatement::KIND);
        Ok(FakeStatement {
            id,
            state: Arc::clone(&self.state),
        })
    }

    async fn query(&mut self, _statement: &FakeStatement) -> StoreResult<FakeCursor> {
        let mut state = self.state.lock().unwrap();
        state.check(Failure::Query)?;
        let id = state.open(FakeCursor::KIND);
        Ok(FakeCursor {
            id,
            rows: state.rows.clone().into_iter(),
            state: Arc::clone(&self.state),
        })
    }

    async fn execute(&mut self, _statement: &FakeStatement) -> StoreResult<u64> {
        let state = self.state.lock().unwrap();
        state.check(Failure::Execute)?;
        Ok(state.rows_affected)
    }
}

pub struct FakeStatement {
    id: usize,
    state: Shared,
}

impl Release for FakeStatement {
    const KIND: &'static str = "statement";

    fn release(&mut self) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Closed(Self::KIND, self.id));
        state.check(Failure::ReleaseStatement)
    }
}

impl StoreStatement for FakeStatement {
    fn bind(&mut self, param: SqlParam) {
        self.state.lock().unwrap().events.push(Event::Bound(param));
    }
}

pub struct FakeCursor {
    id: usize,
    rows: std::vec::IntoIter<FakeRow>,
    state: Shared,
}

impl Release for FakeCursor {
    const KIND: &'static str = "cursor";

    fn release(&mut self) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Closed(Self::KIND, self.id));
        state.check(Failure::ReleaseCursor)
    }
}

#[async_trait]
impl RowCursor for FakeCursor {
    type Row = FakeRow;

    async fn next_row(&mut self) -> StoreResult<Option<FakeRow>> {
        self.state.lock().unwrap().check(Failure::NextRow)?;
        Ok(self.rows.next())
    }
}

pub fn ann() -> Student {
    Student::new(1, "Ann", "Smith", "a@x.com")
}

pub fn bo() -> Student {
    Student::new(2, "Bo", "Jones", "b@x.com")
}
