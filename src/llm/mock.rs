//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns.

use async_trait::async_trait;

use crate::error::{AskdbError, Result};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for unit testing without making real API calls.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// When set, every call fails with this message.
    failure: Option<String>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the prompt contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Makes every call fail, simulating an unreachable model server.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Generates a mock response based on the prompt.
    fn mock_response(&self, prompt: &str) -> String {
        let prompt_lower = prompt.to_lowercase();

        // Check custom responses first
        for (pattern, response) in &self.custom_responses {
            if prompt_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        // Default pattern matching
        if prompt_lower.contains("how many") && prompt_lower.contains("customer") {
            return "```sql\nSELECT COUNT(*) FROM customers;\n```".to_string();
        }

        if prompt_lower.contains("all customers") || prompt_lower.contains("show me all customers")
        {
            return "```sql\nSELECT * FROM customers;\n```".to_string();
        }

        if prompt_lower.contains("order") && prompt_lower.contains("customer") {
            return "```sql\nSELECT c.name, o.order_date FROM customers c\n\
                    JOIN orders o ON o.customer_id = c.id;\n```"
                .to_string();
        }

        if prompt_lower.contains("product") {
            return "SELECT name, price FROM products".to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Some(message) = &self.failure {
            return Err(AskdbError::llm(message.clone()));
        }
        Ok(self.mock_response(prompt))
    }
}
