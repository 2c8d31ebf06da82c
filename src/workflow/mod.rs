//! Question-to-query workflow for askdb.
//!
//! This module isolates the pipeline state machine and its typed state record
//! from the LLM, policy, and database collaborators it sequences.

mod pipeline;
mod state;

pub use pipeline::Pipeline;
pub use state::{StageUpdate, WorkflowState};
