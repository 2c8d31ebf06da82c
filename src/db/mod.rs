//! Database abstraction layer for askdb.
//!
//! Provides a trait-based interface for query execution, allowing the real
//! PostgreSQL backend and the in-memory mock to be used interchangeably.

mod mock;
mod postgres;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use types::{ColumnInfo, ExecutionOutput, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Creates a real database client for the given connection configuration.
pub async fn connect(config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>> {
    let client = PostgresClient::connect(config).await?;
    Ok(Arc::new(client))
}

/// Trait defining the interface for database clients.
///
/// Implementations run each statement inside its own transaction with a
/// server-enforced statement timeout, roll back on failure, and release the
/// connection on every exit path.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a validated SQL statement and returns its output.
    ///
    /// An empty statement is rejected before any round-trip.
    async fn execute_query(&self, sql: &str) -> Result<ExecutionOutput>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
