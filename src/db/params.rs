//! Parameter binding utilities for database queries.
//!
//! This module binds `SqlParam` values to database-specific query objects and
//! rewrites `?` placeholders for backends that number their parameters.

use crate::db::source::SqlParam;
use sqlx::mysql::MySqlArguments;
use sqlx::postgres::PgArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Postgres, Sqlite};

/// Bind a parameter to a MySQL query.
pub(crate) fn bind_mysql_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Text(v) => query.bind(v.as_str()),
    }
}

/// Bind a parameter to a PostgreSQL query.
pub(crate) fn bind_postgres_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match param {
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Text(v) => query.bind(v.as_str()),
    }
}

/// Bind a parameter to a SQLite query.
pub(crate) fn bind_sqlite_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Text(v) => query.bind(v.as_str()),
    }
}

/// Rewrite `?` placeholders as `$1`, `$2`, ... for PostgreSQL.
///
/// Question marks inside single-quoted literals are left alone.
pub(crate) fn numbered_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut in_literal = false;
    let mut n = 0;
    for c in sql.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            _ => out.push(c),
        }
    }
    out
}
