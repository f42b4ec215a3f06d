//! Per-participant collection state machine.
//!
//! ```text
//! PENDING --success--------------------------------------------> DONE
//! PENDING --retryable failure, attempts left--> RETRYING --backoff--> PENDING
//! PENDING --retryable failure, no attempts left | terminal | cancel--> MISSING
//! RETRYING --cancel--> MISSING
//! ```

use crate::collector::{VoteCollector, VoteResponse};
use crate::consensus::question::ConsensusQuestion;
use crate::consensus::vote::Vote;
use crate::core::{now, Error};
use crate::orchestrator::config::RetryPolicy;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Collection state of one participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantState {
    /// An attempt is due or in flight
    Pending,
    /// Waiting out the backoff before the next attempt
    Retrying,
    /// A valid vote was accepted
    Done,
    /// Gave up; contributes nothing to the tally
    Missing,
}

impl ParticipantState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, ParticipantState::Done | ParticipantState::Missing)
    }
}

/// Why an attempt failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No reply within the per-vote timeout
    Timeout,
    /// Transient collector failure
    Transient,
    /// Reply failed validation
    Malformed,
    /// Collector reported a non-retryable error
    Rejected,
    /// Question cancelled or its overall deadline passed
    Cancelled,
    /// No reply was ever supplied for the participant
    NoResponse,
}

impl FailureKind {
    /// Classify a collector or validation error.
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::VoteCollectionTimeout { .. } => FailureKind::Timeout,
            Error::VoteCollection(_) => FailureKind::Transient,
            Error::MalformedVote(_) => FailureKind::Malformed,
            _ => FailureKind::Rejected,
        }
    }
}

/// One failed attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptFailure {
    /// 1-based attempt number (0 when no attempt had started)
    pub attempt: u32,
    pub kind: FailureKind,
    pub message: String,
}

/// Final record of a participant's collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantOutcome {
    pub participant_id: String,
    /// `Done` or `Missing`
    pub state: ParticipantState,
    /// Attempts started
    pub attempts: u32,
    /// Failures in attempt order
    pub failures: Vec<AttemptFailure>,
    /// The accepted vote, if any
    pub vote: Option<Vote>,
    /// The reply that failed validation, if any
    pub malformed_response: Option<VoteResponse>,
}

impl ParticipantOutcome {
    /// Outcome for a participant whose task never reported back.
    pub fn abandoned(participant_id: &str, reason: &str) -> Self {
        Self {
            participant_id: participant_id.to_string(),
            state: ParticipantState::Missing,
            attempts: 0,
            failures: vec![AttemptFailure {
                attempt: 0,
                kind: FailureKind::Cancelled,
                message: reason.to_string(),
            }],
            vote: None,
            malformed_response: None,
        }
    }

    /// Whether the participant contributes no vote.
    pub fn is_missing(&self) -> bool {
        self.state == ParticipantState::Missing
    }
}

/// Drives one participant through the state machine.
#[derive(Debug)]
pub struct ParticipantTracker {
    participant_id: String,
    state: ParticipantState,
    attempts: u32,
    max_attempts: u32,
    failures: Vec<AttemptFailure>,
    vote: Option<Vote>,
    malformed_response: Option<VoteResponse>,
}

impl ParticipantTracker {
    /// Start in `Pending` with an attempt budget (at least one).
    pub fn new(participant_id: &str, max_attempts: u32) -> Self {
        Self {
            participant_id: participant_id.to_string(),
            state: ParticipantState::Pending,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            failures: Vec::new(),
            vote: None,
            malformed_response: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> ParticipantState {
        self.state
    }

    /// Attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The participant being tracked.
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Mark an attempt as started; returns its 0-based index.
    pub fn begin_attempt(&mut self) -> u32 {
        let index = self.attempts;
        if self.state == ParticipantState::Pending {
            self.attempts += 1;
        } else {
            debug!(participant = %self.participant_id, state = ?self.state, "Attempt outside PENDING ignored");
        }
        index
    }

    /// PENDING -> DONE.
    pub fn record_success(&mut self, vote: Vote) {
        if self.state != ParticipantState::Pending {
            debug!(participant = %self.participant_id, state = ?self.state, "Late vote ignored");
            return;
        }
        self.vote = Some(vote);
        self.state = ParticipantState::Done;
    }

    /// PENDING -> RETRYING or MISSING, depending on the error and the budget.
    pub fn record_failure(&mut self, err: &Error, raw: Option<VoteResponse>) -> ParticipantState {
        if self.state != ParticipantState::Pending {
            debug!(participant = %self.participant_id, state = ?self.state, "Failure outside PENDING ignored");
            return self.state;
        }

        self.failures.push(AttemptFailure {
            attempt: self.attempts,
            kind: FailureKind::classify(err),
            message: err.to_string(),
        });
        if raw.is_some() {
            self.malformed_response = raw;
        }

        self.state = if err.is_retryable() && self.attempts < self.max_attempts {
            ParticipantState::Retrying
        } else {
            ParticipantState::Missing
        };
        self.state
    }

    /// RETRYING -> PENDING once the backoff has elapsed.
    pub fn resume(&mut self) {
        if self.state == ParticipantState::Retrying {
            self.state = ParticipantState::Pending;
        }
    }

    /// PENDING or RETRYING -> MISSING.
    pub fn cancel(&mut self, reason: &str) {
        self.give_up(FailureKind::Cancelled, reason);
    }

    /// PENDING -> MISSING for a participant that never replied at all.
    pub fn record_no_response(&mut self, reason: &str) {
        self.give_up(FailureKind::NoResponse, reason);
    }

    fn give_up(&mut self, kind: FailureKind, reason: &str) {
        if self.state.is_terminal() {
            return;
        }
        self.failures.push(AttemptFailure {
            attempt: self.attempts,
            kind,
            message: reason.to_string(),
        });
        self.state = ParticipantState::Missing;
    }

    /// Freeze into an outcome.
    pub fn into_outcome(self) -> ParticipantOutcome {
        ParticipantOutcome {
            participant_id: self.participant_id,
            state: self.state,
            attempts: self.attempts,
            failures: self.failures,
            vote: self.vote,
            malformed_response: self.malformed_response,
        }
    }
}

/// Run one participant's attempt sequence to DONE or MISSING.
pub(crate) async fn collect_participant<C: VoteCollector + ?Sized>(
    collector: &C,
    participant_id: &str,
    question: &ConsensusQuestion,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> ParticipantOutcome {
    let mut tracker = ParticipantTracker::new(participant_id, question.max_attempts());
    let timeout = question.per_vote_timeout();

    loop {
        let attempt = tracker.begin_attempt();
        debug!(
            question_id = %question.question_id,
            participant = participant_id,
            attempt = attempt + 1,
            "Collecting vote"
        );

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracker.cancel("question cancelled while collecting");
                break;
            }
            reply = tokio::time::timeout(timeout, collector.collect(participant_id, question)) => reply,
        };

        let outcome = match reply {
            Err(_) => Err((
                Error::VoteCollectionTimeout {
                    participant: participant_id.to_string(),
                    timeout_ms: question.per_vote_timeout_ms,
                },
                None,
            )),
            Ok(Err(err)) => Err((err, None)),
            Ok(Ok(response)) => match response.validate(participant_id, now()) {
                Ok(vote) => Ok(vote),
                Err(err) => Err((err, Some(response))),
            },
        };

        let (err, raw) = match outcome {
            Ok(vote) => {
                tracker.record_success(vote);
                break;
            }
            Err(failure) => failure,
        };

        match tracker.record_failure(&err, raw) {
            ParticipantState::Retrying => {
                let delay = retry.backoff(attempt);
                warn!(
                    question_id = %question.question_id,
                    participant = participant_id,
                    attempt = attempt + 1,
                    max_attempts = question.max_attempts(),
                    backoff_ms = delay.as_millis() as u64,
                    error = %err,
                    "Vote collection failed, retrying"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracker.cancel("question cancelled during backoff");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => tracker.resume(),
                }
            }
            _ => {
                warn!(
                    question_id = %question.question_id,
                    participant = participant_id,
                    attempts = tracker.attempts(),
                    error = %err,
                    "Participant marked missing"
                );
                break;
            }
        }
    }

    tracker.into_outcome()
}
