//! Decision Workflow
//!
//! Multi-round decisions where each question may depend on earlier results:
//! - Strictly sequential rounds with abort and cancellation
//! - Prompt placeholders filled from the previous round

pub mod prompt;
#[allow(clippy::module_inception)]
pub mod workflow;

pub use prompt::render_prompt;
pub use workflow::{DecisionWorkflow, RoundTemplate, WorkflowState};
