//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient`
//! trait using sqlx. Every statement runs in its own transaction with a
//! server-enforced statement timeout; failures roll the transaction back.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseClient, ExecutionOutput, QueryResult, Row, Value};
use crate::error::{AskdbError, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column as SqlxColumn, Executor, Postgres, Row as SqlxRow, Transaction, TypeInfo};
use std::time::{Duration, Instant};
use tracing::debug;

/// Server-enforced statement timeout, scoped to each transaction.
const STATEMENT_TIMEOUT_MS: u64 = 5000;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connects to the database described by the configuration.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Connected to {}", config.display_string());
        Ok(Self { pool })
    }

    /// Runs the statement inside an open transaction.
    ///
    /// Prepares the statement first to learn whether it produces a result
    /// descriptor: read queries are fetched as rows, descriptor-less
    /// statements report their affected-row count.
    async fn run_in_transaction(
        tx: &mut Transaction<'_, Postgres>,
        sql: &str,
    ) -> Result<ExecutionOutput> {
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {STATEMENT_TIMEOUT_MS}"
        ))
        .execute(&mut **tx)
        .await
        .map_err(execution_error)?;

        let describe = (&mut **tx).describe(sql).await.map_err(execution_error)?;

        if describe.columns().is_empty() {
            let done = sqlx::query(sql)
                .execute(&mut **tx)
                .await
                .map_err(execution_error)?;
            return Ok(ExecutionOutput::Affected(done.rows_affected()));
        }

        let pg_rows = sqlx::query(sql)
            .fetch_all(&mut **tx)
            .await
            .map_err(execution_error)?;

        let columns: Vec<ColumnInfo> = describe
            .columns()
            .iter()
            .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
            .collect();

        let rows: Vec<Row> = pg_rows.iter().map(convert_row).collect();

        Ok(ExecutionOutput::Rows(QueryResult::with_data(columns, rows)))
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&self, sql: &str) -> Result<ExecutionOutput> {
        if sql.trim().is_empty() {
            return Err(AskdbError::query("no sql to execute"));
        }

        let start = Instant::now();

        let mut tx = self.pool.begin().await.map_err(execution_error)?;

        match Self::run_in_transaction(&mut tx, sql).await {
            Ok(output) => {
                tx.commit().await.map_err(execution_error)?;
                debug!("Query executed in {:?}", start.elapsed());
                Ok(match output {
                    ExecutionOutput::Rows(result) => {
                        ExecutionOutput::Rows(result.with_execution_time(start.elapsed()))
                    }
                    other => other,
                })
            }
            Err(e) => {
                // Rollback to keep the connection clean before it returns
                // to the pool; the pool reclaims it even if rollback fails.
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // For all other types, try to get as string
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Wraps a driver error into the execution-failure shape returned upstream.
fn execution_error(error: sqlx::Error) -> AskdbError {
    AskdbError::query(format!("sql execution error: {}", format_query_error(error)))
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> AskdbError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        AskdbError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        AskdbError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        AskdbError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        AskdbError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        AskdbError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        AskdbError::connection(error.to_string())
    }
}

/// Formats a query error with detail and hints if available.
fn format_query_error(error: sqlx::Error) -> String {
    let error_str = error.to_string();

    let mut result = String::new();

    if let Some(db_error) = error.as_database_error() {
        result.push_str("ERROR: ");
        result.push_str(db_error.message());

        if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
            if let Some(detail) = pg_error.detail() {
                result.push_str("\n  DETAIL: ");
                result.push_str(detail);
            }

            if let Some(hint) = pg_error.hint() {
                result.push_str("\n  HINT: ");
                result.push_str(hint);
            }
        }
    } else {
        result = error_str;
    }

    result
}
