//! LLM integration for askdb.
//!
//! Provides the text-generation trait the pipeline depends on, plus the
//! Ollama-backed and mock implementations and the SQL extraction helpers.

pub mod extract;
pub mod mock;
pub mod ollama;
pub mod prompt;

pub use extract::extract_sql;
pub use mock::MockLlmClient;
pub use ollama::{OllamaClient, OllamaConfig};
pub use prompt::build_prompt;

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::Result;

/// Trait for LLM clients that can generate text from a prompt.
///
/// Implementations must be thread-safe (Send + Sync) to support concurrent
/// pipeline invocations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates free-form text for the given prompt.
    ///
    /// Network, timeout, and protocol failures are returned as errors, never
    /// raised as panics.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Local Ollama instance.
    #[default]
    Ollama,
    /// Mock client for testing (no server required).
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Creates an LLM client for the given provider and configuration.
pub fn create_client(provider: LlmProvider, config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match provider {
        LlmProvider::Ollama => {
            let client = OllamaClient::new(
                OllamaConfig::new(&config.model)
                    .with_url(&config.base_url)
                    .with_timeout(config.timeout_secs),
            )?;
            Ok(Arc::new(client))
        }
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}
