//! Mock database clients for testing.
//!
//! Provides in-memory implementations so the pipeline can be exercised
//! without a running PostgreSQL server.

use super::{ColumnInfo, DatabaseClient, ExecutionOutput, QueryResult, Row, Value};
use crate::error::{AskdbError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// A mock database client that returns predefined results.
pub struct MockDatabaseClient {
    columns: Vec<ColumnInfo>,
    rows: Vec<Row>,
}

impl MockDatabaseClient {
    /// Creates a mock client with a small default result set.
    pub fn new() -> Self {
        Self {
            columns: vec![
                ColumnInfo::new("id", "INT4"),
                ColumnInfo::new("name", "TEXT"),
            ],
            rows: vec![
                vec![Value::Int(1), Value::String("Alice".to_string())],
                vec![Value::Int(2), Value::String("Bob".to_string())],
            ],
        }
    }

    /// Creates a mock client returning the given result set for reads.
    pub fn with_rows(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<ExecutionOutput> {
        if sql.trim().is_empty() {
            return Err(AskdbError::query("no sql to execute"));
        }

        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            let result = QueryResult::with_data(self.columns.clone(), self.rows.clone())
                .with_execution_time(Duration::from_millis(1));
            Ok(ExecutionOutput::Rows(result))
        } else {
            // Statements without a result descriptor report a row count.
            Ok(ExecutionOutput::Affected(0))
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A mock database client whose queries always fail.
///
/// Used to test the executor error path and rollback reporting.
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a client that fails every query with the given driver message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<ExecutionOutput> {
        if sql.trim().is_empty() {
            return Err(AskdbError::query("no sql to execute"));
        }
        Err(AskdbError::query(format!(
            "sql execution error: {}",
            self.message
        )))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
