//! End-to-end session flows against a real SQLite database.

use std::sync::Arc;
use student_tracker::config::DatabaseConfig;
use student_tracker::db::{DbPool, SqlxSource};
use student_tracker::{Navigation, NewStudent, Student, StudentSession, StudentStore};
use tempfile::NamedTempFile;

async fn setup_session() -> (StudentSession<SqlxSource>, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let config =
        DatabaseConfig::parse(&format!("sqlite:{}", temp_file.path().to_str().unwrap())).unwrap();
    let source = Arc::new(SqlxSource::new(config));

    if let DbPool::SQLite(pool) = source.pool().await.unwrap() {
        sqlx::query(
            "CREATE TABLE student (id INTEGER PRIMARY KEY, first_name TEXT, last_name TEXT, email TEXT)",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    (StudentSession::new(StudentStore::new(source)), temp_file)
}

#[tokio::test]
async fn test_add_edit_delete_flow() {
    let (mut session, _file) = setup_session().await;

    let nav = session
        .trigger_create(&NewStudent::new("Ann", "Smith", "a@x.com"))
        .await;
    assert_eq!(nav, Navigation::ListStudents);
    session
        .trigger_create(&NewStudent::new("Bo", "Jones", "b@x.com"))
        .await;

    session.trigger_load().await;
    assert_eq!(
        session.results(),
        &[
            Student::new(2, "Bo", "Jones", "b@x.com"),
            Student::new(1, "Ann", "Smith", "a@x.com"),
        ]
    );

    let Navigation::EditForm(mut student) = session.trigger_prepare_edit(1).await else {
        panic!("expected edit form, error: {:?}", session.take_error());
    };
    student.email = "ann@x.com".to_string();
    assert_eq!(
        session.trigger_update(&student).await,
        Navigation::ListStudents
    );

    assert_eq!(session.trigger_delete(2).await, Navigation::ListStudents);

    session.trigger_load().await;
    assert_eq!(
        session.results(),
        &[Student::new(1, "Ann", "Smith", "ann@x.com")]
    );
    assert!(session.take_error().is_none());
}

#[tokio::test]
async fn test_search_scenario() {
    let (mut session, _file) = setup_session().await;
    session
        .trigger_create(&NewStudent::new("Ann", "Smith", "a@x.com"))
        .await;
    session
        .trigger_create(&NewStudent::new("Bo", "Jones", "b@x.com"))
        .await;

    session.set_pending_filter("jo");
    session.trigger_load().await;

    assert_eq!(
        session.results(),
        &[Student::new(2, "Bo", "Jones", "b@x.com")]
    );
    assert!(session.pending_filter().is_none());
}

#[tokio::test]
async fn test_prepare_edit_unknown_id() {
    let (mut session, _file) = setup_session().await;
    session
        .trigger_create(&NewStudent::new("Ann", "Smith", "a@x.com"))
        .await;
    session.trigger_load().await;
    let before = session.results().to_vec();

    assert_eq!(session.trigger_prepare_edit(999).await, Navigation::Stay);

    assert_eq!(session.results(), before.as_slice());
    assert_eq!(
        session.take_error().as_deref(),
        Some("Error: Could not find student id: 999")
    );
}
