//! End-to-end pipeline tests using the mock LLM and mock database.
//!
//! These exercise the full Generate -> Validate -> {Execute | Fail} flow
//! without a model server or PostgreSQL instance.

use std::sync::Arc;

use askdb::db::{ColumnInfo, MockDatabaseClient, Value};
use askdb::llm::MockLlmClient;
use askdb::policy::QueryPolicy;
use askdb::workflow::Pipeline;

fn pipeline_with(llm: MockLlmClient) -> Pipeline {
    Pipeline::new(
        Arc::new(llm),
        Arc::new(MockDatabaseClient::with_rows(
            vec![ColumnInfo::new("name", "TEXT")],
            vec![
                vec![Value::String("Alice".to_string())],
                vec![Value::String("Bob".to_string())],
            ],
        )),
        Arc::new(QueryPolicy::default()),
    )
}

#[tokio::test]
async fn valid_question_returns_rows() {
    let llm = MockLlmClient::new().with_response("names", "SELECT name FROM customers");
    let state = pipeline_with(llm).run_query("customer names").await;

    assert_eq!(state.sql.as_deref(), Some("SELECT name FROM customers"));
    assert_eq!(state.valid, Some(true));
    assert!(state.error.is_none());
    assert!(state.result.is_some());
}

#[tokio::test]
async fn disallowed_table_is_rejected_and_named() {
    let llm = MockLlmClient::new().with_response("secrets", "SELECT * FROM admin_secrets");
    let state = pipeline_with(llm).run_query("show me the secrets").await;

    assert_eq!(state.valid, Some(false));
    let error = state.error.expect("expected a validation error");
    assert!(error.contains("admin_secrets"), "error was: {error}");
    assert!(state.result.is_none());
}

#[tokio::test]
async fn write_statement_never_reaches_the_database() {
    let llm = MockLlmClient::new().with_response("cleanup", "DELETE FROM orders");
    let state = pipeline_with(llm).run_query("cleanup old orders").await;

    assert_eq!(state.valid, Some(false));
    assert_eq!(
        state.error.as_deref(),
        Some("only SELECT queries are allowed")
    );
    assert!(state.result.is_none());
}

#[tokio::test]
async fn injection_attempt_is_rejected() {
    let llm =
        MockLlmClient::new().with_response("everything", "SELECT 1; DROP TABLE customers");
    let state = pipeline_with(llm).run_query("give me everything").await;

    assert_eq!(state.valid, Some(false));
    assert!(state
        .error
        .as_deref()
        .unwrap()
        .contains("forbidden pattern detected"));
}

#[tokio::test]
async fn fenced_markdown_answer_is_unwrapped() {
    let llm = MockLlmClient::new()
        .with_response("names", "Here you go:\n```sql\nSELECT name FROM customers;\n```");
    let state = pipeline_with(llm).run_query("customer names").await;

    assert_eq!(state.sql.as_deref(), Some("SELECT name FROM customers"));
    assert_eq!(state.valid, Some(true));
    assert!(state.result.is_some());
}

#[tokio::test]
async fn schema_qualified_table_passes_the_allow_list() {
    let llm = MockLlmClient::new().with_response("names", "SELECT * FROM public.customers");
    let state = pipeline_with(llm).run_query("customer names").await;

    assert_eq!(state.valid, Some(true));
    assert!(state.result.is_some());
}

#[tokio::test]
async fn terminal_state_serializes_with_expected_keys() {
    let llm = MockLlmClient::new().with_response("names", "SELECT name FROM customers");
    let state = pipeline_with(llm).run_query("customer names").await;

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["question"], "customer names");
    assert_eq!(json["sql"], "SELECT name FROM customers");
    assert_eq!(json["valid"], true);
    assert!(json.get("error").is_none());

    // Rows come back as ordered field-name to value objects.
    assert_eq!(json["result"][0]["name"], "Alice");
    assert_eq!(json["result"][1]["name"], "Bob");
}

#[tokio::test]
async fn failed_state_omits_result_key() {
    let llm = MockLlmClient::new().with_response("secrets", "SELECT * FROM admin_secrets");
    let state = pipeline_with(llm).run_query("show me the secrets").await;

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["valid"], false);
    assert!(json.get("result").is_none());
    assert!(json["error"].as_str().unwrap().contains("admin_secrets"));
}

#[tokio::test]
async fn custom_policy_restricts_tables() {
    let llm = MockLlmClient::new().with_response("stock", "SELECT * FROM inventory");
    let pipeline = Pipeline::new(
        Arc::new(llm),
        Arc::new(MockDatabaseClient::new()),
        Arc::new(QueryPolicy::new(["inventory"])),
    );

    let state = pipeline.run_query("current stock").await;
    assert_eq!(state.valid, Some(true));
    assert!(state.result.is_some());
}

#[tokio::test]
async fn identical_questions_yield_identical_decisions() {
    let llm = MockLlmClient::new().with_response("secrets", "SELECT * FROM admin_secrets");
    let pipeline = pipeline_with(llm);

    let first = pipeline.run_query("show me the secrets").await;
    let second = pipeline.run_query("show me the secrets").await;

    assert_eq!(first.valid, second.valid);
    assert_eq!(first.error, second.error);
}
