//! Connection pool management.
//!
//! This module provides the production [`ConnectionSource`] on top of
//! database-specific sqlx pools (MySqlPool, PgPool, SqlitePool). The pool is
//! created lazily on the first checkout and exactly once, even when several
//! tasks race to use it.

use crate::config::{DatabaseConfig, DatabaseType};
use crate::db::params::{
    bind_mysql_param, bind_postgres_param, bind_sqlite_param, numbered_placeholders,
};
use crate::db::source::{
    CaseFolding, ColumnAccess, ConnectionSource, Release, RowCursor, SqlParam, StoreConnection,
    StoreStatement,
};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{MySql, MySqlPool, PgPool, Postgres, Row, Sqlite, SqlitePool};
use std::collections::VecDeque;
use std::str::FromStr;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Database-specific connection pool (avoids AnyPool limitations).
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    Postgres(PgPool),
    SQLite(SqlitePool),
}

impl DbPool {
    /// Close the connection pool.
    pub async fn close(&self) {
        match self {
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::SQLite(pool) => pool.close().await,
        }
    }

    /// Get the database type for this pool.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbPool::MySql(_) => DatabaseType::MySQL,
            DbPool::Postgres(_) => DatabaseType::PostgreSQL,
            DbPool::SQLite(_) => DatabaseType::SQLite,
        }
    }
}

/// Connection source backed by a lazily created sqlx pool.
#[derive(Debug)]
pub struct SqlxSource {
    config: DatabaseConfig,
    pool: OnceCell<DbPool>,
}

impl SqlxSource {
    /// Create a source; no connection is made until the first checkout.
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    /// Create a source around an existing pool.
    pub fn with_pool(config: DatabaseConfig, pool: DbPool) -> Self {
        Self {
            config,
            pool: OnceCell::new_with(Some(pool)),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Whether the pool has been created yet.
    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }

    /// Get the pool, creating it on first use.
    pub async fn pool(&self) -> StoreResult<&DbPool> {
        self.pool
            .get_or_try_init(|| create_pool(&self.config))
            .await
    }

    /// Close the pool if it was ever created.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            info!(db_type = %pool.db_type(), "Closing connection pool");
            pool.close().await;
        }
    }
}

#[async_trait]
impl ConnectionSource for SqlxSource {
    type Connection = SqlxConnection;

    async fn acquire(&self) -> StoreResult<SqlxConnection> {
        let pool = self.pool().await?;
        let conn = match pool {
            DbPool::MySql(p) => p.acquire().await.map(SqlxConnection::MySql),
            DbPool::Postgres(p) => p.acquire().await.map(SqlxConnection::Postgres),
            DbPool::SQLite(p) => p.acquire().await.map(SqlxConnection::SQLite),
        };
        conn.map_err(|e| StoreError::connection(e.to_string()))
    }
}

/// Create a connection pool for the given configuration.
async fn create_pool(config: &DatabaseConfig) -> StoreResult<DbPool> {
    let pool_opts = &config.pool_options;
    let is_sqlite = config.db_type == DatabaseType::SQLite;
    let acquire_timeout = pool_opts.acquire_timeout();
    let idle_timeout = Some(pool_opts.idle_timeout());

    info!(
        url = %config.masked_url(),
        db_type = %config.db_type,
        "Creating connection pool"
    );

    let pool = match config.db_type {
        DatabaseType::MySQL => {
            let options = MySqlConnectOptions::from_str(&config.connection_string)
                .map_err(|e| {
                    StoreError::connection(format!("Invalid MySQL connection string: {}", e))
                })?
                .charset("utf8mb4");

            let pool = MySqlPoolOptions::new()
                .min_connections(pool_opts.min_connections_or_default())
                .max_connections(pool_opts.max_connections_or_default(is_sqlite))
                .acquire_timeout(acquire_timeout)
                .idle_timeout(idle_timeout)
                .test_before_acquire(pool_opts.test_before_acquire_or_default())
                .connect_with(options)
                .await
                .map_err(connect_error)?;
            DbPool::MySql(pool)
        }
        DatabaseType::PostgreSQL => {
            let pool = PgPoolOptions::new()
                .min_connections(pool_opts.min_connections_or_default())
                .max_connections(pool_opts.max_connections_or_default(is_sqlite))
                .acquire_timeout(acquire_timeout)
                .idle_timeout(idle_timeout)
                .test_before_acquire(pool_opts.test_before_acquire_or_default())
                .connect(&config.connection_string)
                .await
                .map_err(connect_error)?;
            DbPool::Postgres(pool)
        }
        DatabaseType::SQLite => {
            let options = SqliteConnectOptions::from_str(&config.connection_string)
                .map_err(|e| {
                    StoreError::connection(format!("Invalid SQLite connection string: {}", e))
                })?
                .create_if_missing(true);

            let pool = SqlitePoolOptions::new()
                .min_connections(pool_opts.min_connections_or_default())
                .max_connections(pool_opts.max_connections_or_default(is_sqlite))
                .acquire_timeout(acquire_timeout)
                .idle_timeout(idle_timeout)
                .test_before_acquire(pool_opts.test_before_acquire_or_default())
                .connect_with(options)
                .await
                .map_err(connect_error)?;
            DbPool::SQLite(pool)
        }
    };

    info!(db_type = %config.db_type, "Connection pool ready");
    Ok(pool)
}

fn connect_error(e: sqlx::Error) -> StoreError {
    StoreError::connection(format!("Failed to connect: {}", e))
}

/// A connection checked out of a [`DbPool`]. Dropping it returns it to the pool.
pub enum SqlxConnection {
    MySql(PoolConnection<MySql>),
    Postgres(PoolConnection<Postgres>),
    SQLite(PoolConnection<Sqlite>),
}

impl Release for SqlxConnection {
    const KIND: &'static str = "connection";

    fn release(&mut self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl StoreConnection for SqlxConnection {
    type Statement = SqlxStatement;
    type Cursor = SqlxCursor;

    // SQLite's built-in lower() and LIKE only fold ASCII letters
    fn case_folding(&self) -> CaseFolding {
        match self {
            SqlxConnection::SQLite(_) => CaseFolding::Ascii,
            _ => CaseFolding::Unicode,
        }
    }

    fn prepare(&mut self, sql: &str) -> StoreResult<SqlxStatement> {
        let sql = match self {
            SqlxConnection::Postgres(_) => numbered_placeholders(sql),
            _ => sql.to_string(),
        };
        Ok(SqlxStatement {
            sql,
            params: Vec::new(),
        })
    }

    async fn query(&mut self, statement: &SqlxStatement) -> StoreResult<SqlxCursor> {
        debug!(
            sql = %statement.sql,
            param_types = ?statement.param_types(),
            "Executing query"
        );

        let rows: VecDeque<SqlxRow> = match self {
            SqlxConnection::MySql(conn) => {
                let mut query = sqlx::query(&statement.sql);
                for param in &statement.params {
                    query = bind_mysql_param(query, param);
                }
                let rows = query.fetch_all(&mut **conn).await?;
                rows.into_iter().map(SqlxRow::MySql).collect()
            }
            SqlxConnection::Postgres(conn) => {
                let mut query = sqlx::query(&statement.sql);
                for param in &statement.params {
                    query = bind_postgres_param(query, param);
                }
                let rows = query.fetch_all(&mut **conn).await?;
                rows.into_iter().map(SqlxRow::Postgres).collect()
            }
            SqlxConnection::SQLite(conn) => {
                let mut query = sqlx::query(&statement.sql);
                for param in &statement.params {
                    query = bind_sqlite_param(query, param);
                }
                let rows = query.fetch_all(&mut **conn).await?;
                rows.into_iter().map(SqlxRow::SQLite).collect()
            }
        };

        Ok(SqlxCursor { rows })
    }

    async fn execute(&mut self, statement: &SqlxStatement) -> StoreResult<u64> {
        debug!(
            sql = %statement.sql,
            param_types = ?statement.param_types(),
            "Executing write operation"
        );

        let result = match self {
            SqlxConnection::MySql(conn) => {
                let mut query = sqlx::query(&statement.sql);
                for param in &statement.params {
                    query = bind_mysql_param(query, param);
                }
                query.execute(&mut **conn).await?.rows_affected()
            }
            SqlxConnection::Postgres(conn) => {
                let mut query = sqlx::query(&statement.sql);
                for param in &statement.params {
                    query = bind_postgres_param(query, param);
                }
                query.execute(&mut **conn).await?.rows_affected()
            }
            SqlxConnection::SQLite(conn) => {
                let mut query = sqlx::query(&statement.sql);
                for param in &statement.params {
                    query = bind_sqlite_param(query, param);
                }
                query.execute(&mut **conn).await?.rows_affected()
            }
        };

        Ok(result)
    }
}

/// SQL text plus its bound parameters, sent to the driver as one prepared query.
#[derive(Debug, Clone)]
pub struct SqlxStatement {
    sql: String,
    params: Vec<SqlParam>,
}

impl SqlxStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Type names of the bound parameters, in binding order.
    pub fn param_types(&self) -> Vec<&'static str> {
        self.params.iter().map(SqlParam::type_name).collect()
    }
}

impl Release for SqlxStatement {
    const KIND: &'static str = "statement";

    fn release(&mut self) -> StoreResult<()> {
        self.params.clear();
        Ok(())
    }
}

impl StoreStatement for SqlxStatement {
    fn bind(&mut self, param: SqlParam) {
        self.params.push(param);
    }
}

/// Rows fetched by a query, handed out front to back.
pub struct SqlxCursor {
    rows: VecDeque<SqlxRow>,
}

impl Release for SqlxCursor {
    const KIND: &'static str = "cursor";

    fn release(&mut self) -> StoreResult<()> {
        self.rows.clear();
        Ok(())
    }
}

#[async_trait]
impl RowCursor for SqlxCursor {
    type Row = SqlxRow;

    async fn next_row(&mut self) -> StoreResult<Option<SqlxRow>> {
        Ok(self.rows.pop_front())
    }
}

/// A result row from any supported backend.
pub enum SqlxRow {
    MySql(MySqlRow),
    Postgres(PgRow),
    SQLite(SqliteRow),
}

impl ColumnAccess for SqlxRow {
    fn get_i64(&self, column: &str) -> StoreResult<i64> {
        // PostgreSQL and MySQL report INT columns as 32-bit
        let value = match self {
            SqlxRow::MySql(row) => row
                .try_get::<i64, _>(column)
                .or_else(|_| row.try_get::<i32, _>(column).map(i64::from)),
            SqlxRow::Postgres(row) => row
                .try_get::<i64, _>(column)
                .or_else(|_| row.try_get::<i32, _>(column).map(i64::from)),
            SqlxRow::SQLite(row) => row.try_get::<i64, _>(column),
        };
        value.map_err(StoreError::from)
    }

    fn get_text(&self, column: &str) -> StoreResult<String> {
        let value = match self {
            SqlxRow::MySql(row) => row.try_get::<String, _>(column),
            SqlxRow::Postgres(row) => row.try_get::<String, _>(column),
            SqlxRow::SQLite(row) => row.try_get::<String, _>(column),
        };
        value.map_err(StoreError::from)
    }
}
