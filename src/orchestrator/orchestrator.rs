//! Consensus orchestrator.
//!
//! Fans a question out to every participant concurrently, waits for each to
//! reach DONE or MISSING, applies the quorum gate, runs the engine, and
//! appends one audit record per question.

use crate::audit::AuditLog;
use crate::collector::{VoteCollector, VoteResponse};
use crate::consensus::{
    ConsensusEngine, ConsensusQuestion, ConsensusResult, ConsensusStatus, Vote,
};
use crate::core::{now, Result};
use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::participant::{
    collect_participant, ParticipantOutcome, ParticipantTracker,
};
use crate::workflow::{DecisionWorkflow, RoundTemplate};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Interruption {
    Deadline,
    Cancelled,
}

impl Interruption {
    fn reason(self) -> &'static str {
        match self {
            Interruption::Deadline => "overall deadline exceeded",
            Interruption::Cancelled => "question cancelled",
        }
    }
}

/// Runs consensus questions against a vote collector.
pub struct Orchestrator<C: VoteCollector + 'static> {
    collector: Arc<C>,
    audit: Arc<AuditLog>,
    config: OrchestratorConfig,
}

impl<C: VoteCollector + 'static> Orchestrator<C> {
    /// Create with default configuration and a fresh audit log.
    pub fn new(collector: C) -> Self {
        Self::with_config(collector, OrchestratorConfig::default())
    }

    /// Create with explicit configuration.
    pub fn with_config(collector: C, config: OrchestratorConfig) -> Self {
        Self::from_shared(Arc::new(collector), config)
    }

    /// Create around an already shared collector.
    pub fn from_shared(collector: Arc<C>, config: OrchestratorConfig) -> Self {
        Self {
            collector,
            audit: Arc::new(AuditLog::new()),
            config,
        }
    }

    /// Record into an existing (possibly shared) audit log.
    pub fn with_audit_log(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    /// Shared handle to the audit log.
    pub fn audit(&self) -> Arc<AuditLog> {
        Arc::clone(&self.audit)
    }

    /// Configuration in effect.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Collect votes and decide.
    ///
    /// Only a validation error is returned as `Err`, and it is raised before
    /// any participant is contacted. Every other outcome, including missing
    /// participants and failed quorum, comes back as a result.
    pub async fn submit(&self, question: ConsensusQuestion) -> Result<ConsensusResult> {
        self.run(question, self.config.overall_deadline(), CancellationToken::new())
            .await
    }

    /// Like [`submit`](Self::submit) with an overall deadline.
    ///
    /// When it passes, participants still pending become MISSING and the
    /// question proceeds straight to the quorum check.
    pub async fn submit_with_deadline(
        &self,
        question: ConsensusQuestion,
        deadline: Duration,
    ) -> Result<ConsensusResult> {
        self.run(question, Some(deadline), CancellationToken::new())
            .await
    }

    /// Like [`submit`](Self::submit), stoppable through `cancel`.
    ///
    /// A cancelled question is still audited, with status `Aborted` and no
    /// decision.
    pub async fn submit_cancellable(
        &self,
        question: ConsensusQuestion,
        cancel: CancellationToken,
    ) -> Result<ConsensusResult> {
        self.run(question, self.config.overall_deadline(), cancel)
            .await
    }

    /// Decide from replies gathered elsewhere.
    ///
    /// Replies go through the same validation as collected ones. Participants
    /// without a reply are MISSING; replies from non-participants are ignored.
    pub fn inject_votes(
        &self,
        question: ConsensusQuestion,
        responses: Vec<VoteResponse>,
    ) -> Result<ConsensusResult> {
        question.validate()?;
        let started = Instant::now();
        let received_at = now();

        let mut by_participant: HashMap<&str, &VoteResponse> = HashMap::new();
        for response in &responses {
            if question.participant_index(&response.participant_id).is_none() {
                warn!(
                    question_id = %question.question_id,
                    participant = %response.participant_id,
                    "Ignoring injected vote from non-participant"
                );
                continue;
            }
            if by_participant
                .insert(response.participant_id.as_str(), response)
                .is_some()
            {
                warn!(
                    question_id = %question.question_id,
                    participant = %response.participant_id,
                    "Duplicate injected vote, keeping the last"
                );
            }
        }

        let outcomes = question
            .participants
            .iter()
            .map(|participant| {
                let mut tracker = ParticipantTracker::new(participant, 1);
                match by_participant.get(participant.as_str()) {
                    Some(response) => {
                        tracker.begin_attempt();
                        match response.validate(participant, received_at) {
                            Ok(vote) => tracker.record_success(vote),
                            Err(err) => {
                                tracker.record_failure(&err, Some((*response).clone()));
                            }
                        }
                    }
                    None => tracker.record_no_response("no vote injected"),
                }
                tracker.into_outcome()
            })
            .collect();

        Ok(self.conclude(question, outcomes, started.elapsed(), false))
    }

    /// Run templates as a sequential workflow; see [`DecisionWorkflow`].
    pub async fn run_workflow(&self, templates: Vec<RoundTemplate>) -> Result<Vec<ConsensusResult>> {
        let mut workflow = DecisionWorkflow::new(uuid::Uuid::new_v4().to_string());
        for template in templates {
            workflow = workflow.boxed_round(template);
        }
        workflow.run(self).await
    }

    async fn run(
        &self,
        question: ConsensusQuestion,
        deadline: Option<Duration>,
        cancel: CancellationToken,
    ) -> Result<ConsensusResult> {
        question.validate()?;
        let started = Instant::now();
        let question = Arc::new(question);

        info!(
            question_id = %question.question_id,
            participants = question.participants.len(),
            required_quorum = question.required_quorum,
            per_vote_timeout_ms = question.per_vote_timeout_ms,
            max_attempts = question.max_attempts(),
            "Dispatching consensus question"
        );

        let stop = cancel.child_token();
        let semaphore = self
            .config
            .max_concurrency
            .map(|permits| Arc::new(Semaphore::new(permits)));
        let mut join_set = JoinSet::new();

        for participant in &question.participants {
            let collector = Arc::clone(&self.collector);
            let question = Arc::clone(&question);
            let retry = self.config.retry.clone();
            let stop = stop.clone();
            let semaphore = semaphore.clone();
            let participant = participant.clone();

            join_set.spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => tokio::select! {
                        permit = semaphore.acquire_owned() => permit.ok(),
                        _ = stop.cancelled() => {
                            return ParticipantOutcome::abandoned(&participant, "stopped before dispatch");
                        }
                    },
                    None => None,
                };
                collect_participant(collector.as_ref(), &participant, &question, &retry, &stop)
                    .await
            });
        }

        let mut outcomes: HashMap<String, ParticipantOutcome> = HashMap::new();
        let deadline_timer = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline_timer);

        let mut interruption = None;
        loop {
            tokio::select! {
                joined = join_set.join_next() => match joined {
                    Some(Ok(outcome)) => {
                        debug!(
                            question_id = %question.question_id,
                            participant = %outcome.participant_id,
                            state = ?outcome.state,
                            attempts = outcome.attempts,
                            "Participant finished"
                        );
                        outcomes.insert(outcome.participant_id.clone(), outcome);
                    }
                    Some(Err(err)) => {
                        warn!(question_id = %question.question_id, error = %err, "Participant task failed");
                    }
                    None => break,
                },
                _ = &mut deadline_timer => {
                    interruption = Some(Interruption::Deadline);
                    break;
                }
                _ = cancel.cancelled() => {
                    interruption = Some(Interruption::Cancelled);
                    break;
                }
            }
        }

        if interruption.is_none() && cancel.is_cancelled() {
            interruption = Some(Interruption::Cancelled);
        }

        if let Some(interruption) = interruption {
            warn!(
                question_id = %question.question_id,
                pending = question.participants.len() - outcomes.len(),
                reason = interruption.reason(),
                "Stopping vote collection"
            );
            // Every await in a participant task watches `stop`, so the drain
            // is prompt.
            stop.cancel();
            while let Some(joined) = join_set.join_next().await {
                if let Ok(outcome) = joined {
                    outcomes.insert(outcome.participant_id.clone(), outcome);
                }
            }
        }

        let reason = interruption
            .map(Interruption::reason)
            .unwrap_or("participant task failed");
        let ordered = question
            .participants
            .iter()
            .map(|p| {
                outcomes
                    .remove(p)
                    .unwrap_or_else(|| ParticipantOutcome::abandoned(p, reason))
            })
            .collect();

        let question = Arc::try_unwrap(question).unwrap_or_else(|shared| (*shared).clone());
        Ok(self.conclude(
            question,
            ordered,
            started.elapsed(),
            interruption == Some(Interruption::Cancelled),
        ))
    }

    /// Quorum gate, engine, audit.
    ///
    /// `outcomes` must be in the question's participant order; that order
    /// fixes the engine's summation order.
    fn conclude(
        &self,
        question: ConsensusQuestion,
        outcomes: Vec<ParticipantOutcome>,
        elapsed: Duration,
        aborted: bool,
    ) -> ConsensusResult {
        let votes_received: Vec<Vote> = outcomes.iter().filter_map(|o| o.vote.clone()).collect();
        let votes_missing: Vec<String> = outcomes
            .iter()
            .filter(|o| o.vote.is_none())
            .map(|o| o.participant_id.clone())
            .collect();

        let status = if aborted {
            ConsensusStatus::Aborted
        } else if votes_received.len() >= question.required_quorum {
            ConsensusStatus::Decided
        } else {
            ConsensusStatus::InsufficientQuorum
        };

        let tally = ConsensusEngine::new(question.calibration)
            .with_summary_limit(self.config.summary_max_chars)
            .tally(&votes_received);
        let received = votes_received.len();
        let result = ConsensusResult::from_tally(
            &question.question_id,
            status,
            tally,
            votes_received,
            votes_missing,
            elapsed.as_millis().min(u64::MAX as u128) as u64,
        );

        match status {
            ConsensusStatus::Decided => info!(
                question_id = %result.question_id,
                decision = ?result.final_decision,
                weighted_score = result.weighted_score,
                confidence_level = result.confidence_level,
                received,
                missing = result.votes_missing.len(),
                duration_ms = result.duration_ms,
                "Consensus reached"
            ),
            ConsensusStatus::InsufficientQuorum => warn!(
                question_id = %result.question_id,
                received,
                required_quorum = question.required_quorum,
                missing = ?result.votes_missing,
                "Insufficient quorum"
            ),
            ConsensusStatus::Aborted => warn!(
                question_id = %result.question_id,
                received,
                "Question aborted before collection finished"
            ),
        }

        if let Err(err) = self.audit.append(question, result.clone(), outcomes) {
            error!(question_id = %result.question_id, error = %err, "Failed to append audit record");
        }
        result
    }
}
