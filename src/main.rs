//! askdb - natural-language database querying behind a strict SQL safety gate.

mod cli;
mod config;
mod db;
mod error;
mod llm;
mod policy;
mod workflow;

use std::sync::Arc;

use cli::Cli;
use config::{Config, ConnectionConfig};
use db::{DatabaseClient, MockDatabaseClient};
use error::{AskdbError, Result};
use llm::LlmProvider;
use policy::QueryPolicy;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use workflow::Pipeline;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries only the result JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(succeeded) => {
            if !succeeded {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Runs one question through the pipeline and prints the terminal state.
///
/// Returns whether the pipeline produced a result.
async fn run() -> Result<bool> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Load configuration file
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    // LLM setup: config file, overridden by environment, then by CLI
    let mut llm_config = config.llm.clone();
    llm_config.apply_env_overrides();
    let provider: LlmProvider = cli
        .llm
        .as_deref()
        .unwrap_or(&llm_config.provider)
        .parse()
        .map_err(AskdbError::config)?;
    let llm = llm::create_client(provider, &llm_config)?;

    // Security policy, fixed for the process lifetime
    let policy = Arc::new(QueryPolicy::new(config.policy.allowed_tables.iter().cloned()));

    // Database setup
    let database: Arc<dyn DatabaseClient> = if cli.mock_db {
        Arc::new(MockDatabaseClient::new())
    } else {
        let connection = resolve_connection(&cli, &config)?.ok_or_else(|| {
            AskdbError::config(
                "No database connection configured. Use --url, connection flags, or a config file.",
            )
        })?;
        info!("Connection: {}", connection.display_string());
        db::connect(&connection).await?
    };

    let mut pipeline = Pipeline::new(llm, Arc::clone(&database), policy);
    if let Some(hint) = &config.policy.schema_hint {
        pipeline = pipeline.with_schema_hint(hint);
    }

    let state = pipeline.run_query(&cli.question).await;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&state)
    } else {
        serde_json::to_string(&state)
    }
    .map_err(|e| AskdbError::internal(format!("Failed to serialize state: {e}")))?;
    println!("{output}");

    database.close().await?;

    Ok(state.succeeded())
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    // Start with CLI connection config if provided
    let mut connection = cli.to_connection_config()?;

    // If no CLI connection, try named connection from config
    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(AskdbError::config(format!(
                    "Connection '{}' not found in config file",
                    name
                )));
            }
        }
    }

    // If still no connection, try default from config
    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    // Apply environment variable defaults
    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
    }

    Ok(connection)
}
