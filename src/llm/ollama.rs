//! Ollama LLM client implementation.
//!
//! Implements the LlmClient trait against the Ollama `/api/generate`
//! endpoint. Requests are non-streaming and carry a bounded client-side
//! timeout; every failure mode is mapped to an error instead of propagating.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AskdbError, Result};
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default Ollama API URL.
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama client configuration.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model to use (e.g., "sqlcoder:7b").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl OllamaConfig {
    /// Creates a new config with the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new("sqlcoder:7b")
    }
}

/// Ollama LLM client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    config: OllamaConfig,
    client: Client,
}

impl OllamaClient {
    /// Creates a new Ollama client with the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AskdbError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Returns the generate API endpoint URL.
    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AskdbError::llm("Request timed out. Try again.")
                } else if e.is_connect() {
                    AskdbError::llm(
                        "Failed to connect to Ollama. Is it running? Try: ollama serve",
                    )
                } else {
                    AskdbError::llm(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AskdbError::llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AskdbError::llm(format!(
                "Ollama API error ({}): {}",
                status, body
            )));
        }

        let response: OllamaResponse = serde_json::from_str(&body)
            .map_err(|e| AskdbError::llm(format!("Failed to parse response: {}", e)))?;

        // Older server versions answer with a `text` field instead of
        // `response`; accept either.
        response
            .response
            .or(response.text)
            .ok_or_else(|| AskdbError::llm("Response contained no generated text"))
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: Option<String>,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = OllamaConfig::new("sqlcoder:7b");
        assert_eq!(config.model, "sqlcoder:7b");
        assert_eq!(config.base_url, DEFAULT_OLLAMA_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_with_url() {
        let config = OllamaConfig::new("sqlcoder:7b").with_url("http://ollama:11434");
        assert_eq!(config.base_url, "http://ollama:11434");
    }

    #[test]
    fn test_config_with_timeout() {
        let config = OllamaConfig::new("sqlcoder:7b").with_timeout(120);
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_config_default() {
        let config = OllamaConfig::default();
        assert_eq!(config.model, "sqlcoder:7b");
    }

    #[test]
    fn test_generate_url() {
        let config = OllamaConfig::new("sqlcoder:7b");
        let client = OllamaClient::new(config).unwrap();
        assert_eq!(
            client.generate_url(),
            "http://localhost:11434/api/generate"
        );
    }

    #[test]
    fn test_response_field_fallback() {
        let with_response: OllamaResponse =
            serde_json::from_str(r#"{"response":"SELECT 1"}"#).unwrap();
        assert_eq!(with_response.response.as_deref(), Some("SELECT 1"));

        let with_text: OllamaResponse = serde_json::from_str(r#"{"text":"SELECT 2"}"#).unwrap();
        assert_eq!(with_text.text.as_deref(), Some("SELECT 2"));

        let with_neither: OllamaResponse = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(with_neither.response.is_none());
        assert!(with_neither.text.is_none());
    }

    #[test]
    fn test_request_serialization() {
        let request = OllamaRequest {
            model: "sqlcoder:7b".to_string(),
            prompt: "SQL:".to_string(),
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "sqlcoder:7b");
        assert_eq!(json["stream"], false);
    }
}
