//! Student Tracker - command-line entry point.
//!
//! A thin presentation layer over [`StudentSession`]: each invocation runs one
//! command, then prints the reloaded student list or the session's error.

use std::process::ExitCode;
use std::sync::Arc;
use student_tracker::config::{Command, Config};
use student_tracker::db::SqlxSource;
use student_tracker::format::format_students;
use student_tracker::{Navigation, NewStudent, Student, StudentSession, StudentStore};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so stdout carries only command output.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse_args();
    init_tracing(&config);

    let db_config = match config.database_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        url = %db_config.masked_url(),
        "Starting student tracker v{}",
        env!("CARGO_PKG_VERSION")
    );

    let source = Arc::new(SqlxSource::new(db_config));
    let store = StudentStore::new(Arc::clone(&source));
    let mut session = StudentSession::new(store);

    let ok = run(&config, &mut session).await;
    source.close().await;

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Run one command against the session. Returns false when the session
/// reported an error.
async fn run(config: &Config, session: &mut StudentSession<SqlxSource>) -> bool {
    let navigation = match &config.command {
        Command::List { search } => {
            if let Some(term) = search {
                session.set_pending_filter(term.clone());
            }
            Navigation::ListStudents
        }
        Command::Show { id } => session.trigger_prepare_edit(*id).await,
        Command::Add {
            first_name,
            last_name,
            email,
        } => {
            let student = NewStudent::new(first_name, last_name, email);
            session.trigger_create(&student).await
        }
        Command::Update {
            id,
            first_name,
            last_name,
            email,
        } => {
            let student = Student::new(*id, first_name, last_name, email);
            session.trigger_update(&student).await
        }
        Command::Delete { id } => session.trigger_delete(*id).await,
    };

    match navigation {
        Navigation::ListStudents => session.trigger_load().await,
        Navigation::EditForm(student) => {
            let output = format_students(std::slice::from_ref(&student), config.format);
            println!("{}", output.trim_end());
            return true;
        }
        Navigation::Stay => {}
    }

    match session.take_error() {
        Some(message) => {
            eprintln!("{}", message);
            false
        }
        None => {
            let output = format_students(session.results(), config.format);
            println!("{}", output.trim_end());
            true
        }
    }
}
