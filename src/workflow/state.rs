//! Workflow state threaded through the pipeline.
//!
//! One `WorkflowState` is created per question and flows through exactly one
//! pass of the pipeline. Stages never touch the state directly; they each
//! produce a `StageUpdate`, and merging only overwrites the fields a stage
//! actually set. That keeps a stage from clearing a field it does not own.

use serde::Serialize;

use crate::db::ExecutionOutput;

/// The record returned to the caller after the pipeline reaches a terminal
/// state. Absent fields mean the corresponding stage was not reached or did
/// not set them.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkflowState {
    /// Original input text. Set once, never mutated.
    pub question: String,

    /// Candidate query string recovered from the model output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,

    /// Validation verdict. Only meaningful once validation has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,

    /// Human-readable failure description from whichever stage failed last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution output. Present only after a successful execution, which
    /// implies `valid == Some(true)` and `error == None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExecutionOutput>,
}

impl WorkflowState {
    /// Creates the initial state for a question.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            sql: None,
            valid: None,
            error: None,
            result: None,
        }
    }

    /// Merges a stage's partial update into the state.
    ///
    /// Only fields the stage set are overwritten; everything else persists.
    pub fn apply(&mut self, update: StageUpdate) {
        if let Some(sql) = update.sql {
            self.sql = Some(sql);
        }
        if let Some(valid) = update.valid {
            self.valid = Some(valid);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
        if let Some(result) = update.result {
            self.result = Some(result);
        }
    }

    /// Returns true if the pipeline produced a result.
    pub fn succeeded(&self) -> bool {
        self.result.is_some()
    }
}

/// Partial update produced by a single pipeline stage.
///
/// Each stage returns only the fields it is responsible for; `None` means
/// "leave the existing value alone".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageUpdate {
    pub sql: Option<String>,
    pub valid: Option<bool>,
    pub error: Option<String>,
    pub result: Option<ExecutionOutput>,
}

impl StageUpdate {
    /// An update that sets the candidate SQL.
    pub fn sql(sql: impl Into<String>) -> Self {
        Self {
            sql: Some(sql.into()),
            ..Self::default()
        }
    }

    /// An update that records a stage failure.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// An update that records the validation verdict.
    pub fn verdict(valid: bool, error: Option<String>) -> Self {
        Self {
            valid: Some(valid),
            error,
            ..Self::default()
        }
    }

    /// An update that records a successful execution.
    pub fn result(output: ExecutionOutput) -> Self {
        Self {
            result: Some(output),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ColumnInfo, QueryResult, Value};

    #[test]
    fn test_new_state_has_only_question() {
        let state = WorkflowState::new("how many customers?");
        assert_eq!(state.question, "how many customers?");
        assert!(state.sql.is_none());
        assert!(state.valid.is_none());
        assert!(state.error.is_none());
        assert!(state.result.is_none());
        assert!(!state.succeeded());
    }

    #[test]
    fn test_apply_overwrites_only_set_fields() {
        let mut state = WorkflowState::new("q");
        state.apply(StageUpdate::sql("SELECT 1"));
        state.apply(StageUpdate::verdict(true, None));

        // The verdict update did not carry sql, so it must persist.
        assert_eq!(state.sql.as_deref(), Some("SELECT 1"));
        assert_eq!(state.valid, Some(true));
        assert!(state.error.is_none());
    }

    #[test]
    fn test_later_error_overwrites_earlier_error() {
        let mut state = WorkflowState::new("q");
        state.apply(StageUpdate::error("LLM call failed: boom"));
        state.apply(StageUpdate::verdict(false, Some("empty sql".to_string())));

        assert_eq!(state.error.as_deref(), Some("empty sql"));
        assert_eq!(state.valid, Some(false));
    }

    #[test]
    fn test_empty_update_changes_nothing() {
        let mut state = WorkflowState::new("q");
        state.apply(StageUpdate::sql("SELECT 1"));
        let before = state.clone();

        state.apply(StageUpdate::default());
        assert_eq!(state, before);
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let state = WorkflowState::new("q");
        let json = serde_json::to_value(&state).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["question"], "q");
    }

    #[test]
    fn test_serialization_of_full_state() {
        let mut state = WorkflowState::new("q");
        state.apply(StageUpdate::sql("SELECT name FROM customers"));
        state.apply(StageUpdate::verdict(true, None));
        state.apply(StageUpdate::result(ExecutionOutput::Rows(
            QueryResult::with_data(
                vec![ColumnInfo::new("name", "TEXT")],
                vec![vec![Value::String("Alice".to_string())]],
            ),
        )));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["question"], "q");
        assert_eq!(json["sql"], "SELECT name FROM customers");
        assert_eq!(json["valid"], true);
        assert_eq!(json["result"][0]["name"], "Alice");
        assert!(json.get("error").is_none());
    }
}
