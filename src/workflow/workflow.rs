//! Sequential multi-round decisions.

use crate::collector::VoteCollector;
use crate::consensus::{ConsensusQuestion, ConsensusResult, ConsensusStatus};
use crate::core::{Error, Result};
use crate::orchestrator::Orchestrator;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Builds round *k*'s question from the results of rounds 1..k-1.
pub type RoundTemplate =
    Box<dyn Fn(&[ConsensusResult]) -> Result<ConsensusQuestion> + Send + Sync>;

/// Workflow lifecycle. Rounds are 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    NotStarted,
    Running { round: usize },
    Completed,
    Aborted { round: usize, reason: String },
}

/// An ordered list of question templates run one round at a time.
///
/// Every round's question ID is scoped as `{workflow_id}/{question_id}`, so
/// `AuditFilter::by_prefix` on `"{workflow_id}/"` selects exactly this
/// workflow's records.
pub struct DecisionWorkflow {
    id: String,
    templates: Vec<RoundTemplate>,
    halt_on_no_decision: bool,
    cancel: CancellationToken,
    state: WorkflowState,
    results: Vec<ConsensusResult>,
}

impl DecisionWorkflow {
    /// Empty workflow; rounds are added with the builder methods.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            templates: Vec::new(),
            halt_on_no_decision: false,
            cancel: CancellationToken::new(),
            state: WorkflowState::NotStarted,
            results: Vec::new(),
        }
    }

    /// Append a round.
    pub fn round<F>(self, template: F) -> Self
    where
        F: Fn(&[ConsensusResult]) -> Result<ConsensusQuestion> + Send + Sync + 'static,
    {
        self.boxed_round(Box::new(template))
    }

    /// Append an already boxed round.
    pub fn boxed_round(mut self, template: RoundTemplate) -> Self {
        self.templates.push(template);
        self
    }

    /// Abort when a round ends without a decision.
    pub fn halt_on_no_decision(mut self, halt: bool) -> Self {
        self.halt_on_no_decision = halt;
        self
    }

    /// Token that aborts the workflow. Cancelling mid-round stops that
    /// round's collection; it is audited as `Aborted`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Prefix for every round's question ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Results of the rounds that completed, in order.
    pub fn results(&self) -> &[ConsensusResult] {
        &self.results
    }

    /// Run every round in order.
    ///
    /// On abort, returns [`Error::WorkflowAborted`]; [`results`](Self::results)
    /// still holds the rounds that completed before it.
    pub async fn run<C: VoteCollector + 'static>(
        &mut self,
        orchestrator: &Orchestrator<C>,
    ) -> Result<Vec<ConsensusResult>> {
        if self.state != WorkflowState::NotStarted {
            return Err(Error::Internal(format!(
                "workflow {} has already run",
                self.id
            )));
        }

        info!(workflow_id = %self.id, rounds = self.templates.len(), "Starting workflow");

        for index in 0..self.templates.len() {
            let round = index + 1;
            if self.cancel.is_cancelled() {
                return Err(self.abort(round, "cancelled before round started".to_string()));
            }
            self.state = WorkflowState::Running { round };

            let mut question = match (self.templates[index])(&self.results) {
                Ok(question) => question,
                Err(err) => return Err(self.abort(round, format!("template failed: {}", err))),
            };
            question.question_id = format!("{}/{}", self.id, question.question_id);

            info!(
                workflow_id = %self.id,
                round,
                question_id = %question.question_id,
                "Submitting workflow round"
            );

            let result = match orchestrator
                .submit_cancellable(question, self.cancel.clone())
                .await
            {
                Ok(result) => result,
                Err(err) => return Err(self.abort(round, format!("question rejected: {}", err))),
            };

            match result.status {
                ConsensusStatus::Aborted => {
                    return Err(self.abort(round, "cancelled during round".to_string()));
                }
                ConsensusStatus::InsufficientQuorum if self.halt_on_no_decision => {
                    let reason = format!(
                        "no decision: {} votes received, {} missing",
                        result.votes_received.len(),
                        result.votes_missing.len()
                    );
                    return Err(self.abort(round, reason));
                }
                _ => {}
            }

            info!(
                workflow_id = %self.id,
                round,
                status = %result.status,
                decision = ?result.final_decision,
                "Workflow round finished"
            );
            self.results.push(result);
        }

        self.state = WorkflowState::Completed;
        info!(workflow_id = %self.id, rounds = self.results.len(), "Workflow completed");
        Ok(self.results.clone())
    }

    fn abort(&mut self, round: usize, reason: String) -> Error {
        warn!(
            workflow_id = %self.id,
            round,
            completed = self.results.len(),
            %reason,
            "Workflow aborted"
        );
        self.state = WorkflowState::Aborted {
            round,
            reason: reason.clone(),
        };
        Error::WorkflowAborted {
            workflow_id: self.id.clone(),
            round,
            reason,
        }
    }
}

impl std::fmt::Debug for DecisionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionWorkflow")
            .field("id", &self.id)
            .field("rounds", &self.templates.len())
            .field("halt_on_no_decision", &self.halt_on_no_decision)
            .field("state", &self.state)
            .field("completed", &self.results.len())
            .finish()
    }
}
