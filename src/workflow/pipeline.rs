//! The question-to-result orchestrator.
//!
//! A fixed four-state machine with no cycles and no retries:
//!
//! ```text
//! Generate -> Validate -> Execute -> (terminal)
//!                      \-> Fail    -> (terminal)
//! ```
//!
//! Generate always hands off to Validate, even when the model call failed.
//! Validate branches on its verdict. Fail is a no-op pass-through that
//! preserves whatever error the preceding stage recorded. The graph is small
//! enough that an explicit enum and match beat any workflow-graph machinery.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::db::DatabaseClient;
use crate::llm::{build_prompt, extract_sql, LlmClient};
use crate::policy::QueryPolicy;
use crate::workflow::{StageUpdate, WorkflowState};

/// Pipeline stages. The transition table lives in `run_query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Generate,
    Validate,
    Execute,
    Fail,
}

/// The natural-language query pipeline.
///
/// Holds shared, read-only collaborators; each `run_query` invocation owns
/// its own state and may run concurrently with others.
pub struct Pipeline {
    llm: Arc<dyn LlmClient>,
    db: Arc<dyn DatabaseClient>,
    policy: Arc<QueryPolicy>,
    schema_hint: Option<String>,
}

impl Pipeline {
    /// Creates a pipeline from its collaborators.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        db: Arc<dyn DatabaseClient>,
        policy: Arc<QueryPolicy>,
    ) -> Self {
        Self {
            llm,
            db,
            policy,
            schema_hint: None,
        }
    }

    /// Overrides the schema description given to the model.
    pub fn with_schema_hint(mut self, hint: impl Into<String>) -> Self {
        self.schema_hint = Some(hint.into());
        self
    }

    /// Runs a question through one pass of the pipeline.
    ///
    /// Never panics across this boundary: every failure is captured in the
    /// returned state's `error` field.
    pub async fn run_query(&self, question: &str) -> WorkflowState {
        let mut state = WorkflowState::new(question);
        let mut stage = Stage::Generate;

        loop {
            match stage {
                Stage::Generate => {
                    state.apply(self.generate(&state).await);
                    stage = Stage::Validate;
                }
                Stage::Validate => {
                    let update = self.validate(&state);
                    let valid = update.valid.unwrap_or(false);
                    state.apply(update);
                    stage = if valid { Stage::Execute } else { Stage::Fail };
                }
                Stage::Execute => {
                    state.apply(self.execute(&state).await);
                    break;
                }
                Stage::Fail => {
                    // Pass-through terminal: the preceding stage's error is
                    // already in the state.
                    break;
                }
            }
        }

        if let Some(error) = &state.error {
            warn!(question, error, "pipeline finished with error");
        } else {
            info!(question, "pipeline finished");
        }

        state
    }

    /// Generate stage: asks the model for SQL and extracts a candidate query.
    async fn generate(&self, state: &WorkflowState) -> StageUpdate {
        let prompt = build_prompt(self.schema_hint.as_deref(), &state.question);
        debug!("requesting SQL generation");

        match self.llm.generate(&prompt).await {
            Ok(raw) => {
                let sql = extract_sql(&raw);
                debug!(sql, "extracted candidate query");
                StageUpdate::sql(sql)
            }
            Err(e) => StageUpdate::error(e.to_string()),
        }
    }

    /// Validate stage: applies the security policy to the candidate query.
    ///
    /// Always emits a verdict. On failure the policy's reason overwrites any
    /// earlier error, so a failed model call followed by an (inevitably)
    /// empty query reports "empty sql" rather than the model-call failure.
    fn validate(&self, state: &WorkflowState) -> StageUpdate {
        let sql = state.sql.as_deref().unwrap_or("");
        match self.policy.validate(sql) {
            Ok(()) => StageUpdate::verdict(true, None),
            Err(reason) => {
                debug!(%reason, "query rejected by policy");
                StageUpdate::verdict(false, Some(reason.to_string()))
            }
        }
    }

    /// Execute stage: runs the validated query.
    async fn execute(&self, state: &WorkflowState) -> StageUpdate {
        let sql = state.sql.as_deref().unwrap_or("");
        match self.db.execute_query(sql).await {
            Ok(output) => StageUpdate::result(output),
            Err(e) => StageUpdate::error(e.to_string()),
        }
    }
}
