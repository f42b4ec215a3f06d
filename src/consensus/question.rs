//! Consensus questions.
//!
//! A [`ConsensusQuestion`] is the unit of work handed to the orchestrator.
//! Questions are assembled with [`QuestionBuilder`]; `build` is the single
//! validation point for calibration, quorum, and participant set.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Default per-attempt timeout.
pub const DEFAULT_PER_VOTE_TIMEOUT_MS: u64 = 30_000;
/// Default number of collection attempts per participant.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Upper bound of the accepted calibration range.
pub const MAX_CALIBRATION: f64 = 2.0;

/// Category of decision being asked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionContext {
    #[default]
    General,
    ToolSelection,
    BudgetAllocation,
    InterpretationDispute,
    ArchitecturalChoice,
    ConflictResolution,
}

/// A decision to put to a set of participants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusQuestion {
    /// Unique question ID
    pub question_id: String,
    /// Prompt text, opaque to the engine
    pub prompt: String,
    /// Decision category
    pub context: DecisionContext,
    /// Participants to poll, in dispatch order
    pub participants: Vec<String>,
    /// Minimum valid votes for a decision
    pub required_quorum: usize,
    /// Deadline for a single collection attempt
    pub per_vote_timeout_ms: u64,
    /// Total collection attempts per participant
    pub max_retries: u32,
    /// Multiplier applied to every confidence
    pub calibration: f64,
}

impl ConsensusQuestion {
    /// Start building a question with the given prompt.
    pub fn builder(prompt: impl Into<String>) -> QuestionBuilder {
        QuestionBuilder::new(prompt)
    }

    /// Per-attempt timeout as a duration.
    pub fn per_vote_timeout(&self) -> Duration {
        Duration::from_millis(self.per_vote_timeout_ms)
    }

    /// Attempts each participant gets; never less than one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Position of a participant in dispatch order.
    pub fn participant_index(&self, participant_id: &str) -> Option<usize> {
        self.participants.iter().position(|p| p == participant_id)
    }

    /// Check every construction invariant.
    ///
    /// Called by [`QuestionBuilder::build`] and again by the orchestrator
    /// before dispatch, since the fields are public.
    pub fn validate(&self) -> Result<()> {
        validate_calibration(self.calibration)?;

        if self.question_id.trim().is_empty() {
            return Err(Error::InvalidQuestion("question_id is empty".to_string()));
        }

        if self.participants.is_empty() {
            return Err(Error::InvalidQuestion(format!(
                "question {} has no participants",
                self.question_id
            )));
        }

        let mut seen = HashSet::new();
        for participant in &self.participants {
            if !seen.insert(participant.as_str()) {
                return Err(Error::InvalidQuestion(format!(
                    "participant {} listed twice in question {}",
                    participant, self.question_id
                )));
            }
        }

        if self.required_quorum < 1 || self.required_quorum > self.participants.len() {
            return Err(Error::InvalidQuestion(format!(
                "required quorum {} must be between 1 and {}",
                self.required_quorum,
                self.participants.len()
            )));
        }

        if self.per_vote_timeout_ms == 0 {
            return Err(Error::InvalidQuestion(
                "per-vote timeout must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Reject calibrations outside `(0, 2]`.
pub fn validate_calibration(calibration: f64) -> Result<()> {
    if calibration.is_finite() && calibration > 0.0 && calibration <= MAX_CALIBRATION {
        Ok(())
    } else {
        Err(Error::CalibrationConfig { value: calibration })
    }
}

/// Builder for [`ConsensusQuestion`].
#[derive(Clone, Debug)]
pub struct QuestionBuilder {
    question_id: Option<String>,
    prompt: String,
    context: DecisionContext,
    participants: Vec<String>,
    required_quorum: Option<usize>,
    per_vote_timeout_ms: u64,
    max_retries: u32,
    calibration: f64,
}

impl QuestionBuilder {
    /// Create a builder with defaults.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            question_id: None,
            prompt: prompt.into(),
            context: DecisionContext::General,
            participants: Vec::new(),
            required_quorum: None,
            per_vote_timeout_ms: DEFAULT_PER_VOTE_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            calibration: 1.0,
        }
    }

    /// Set the question ID (a random UUID otherwise).
    pub fn id(mut self, question_id: impl Into<String>) -> Self {
        self.question_id = Some(question_id.into());
        self
    }

    /// Replace the prompt.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the decision category.
    pub fn context(mut self, context: DecisionContext) -> Self {
        self.context = context;
        self
    }

    /// Add one participant.
    pub fn participant(mut self, participant: impl Into<String>) -> Self {
        self.participants.push(participant.into());
        self
    }

    /// Add several participants.
    pub fn participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participants
            .extend(participants.into_iter().map(Into::into));
        self
    }

    /// Minimum valid votes (all participants otherwise).
    pub fn required_quorum(mut self, quorum: usize) -> Self {
        self.required_quorum = Some(quorum);
        self
    }

    /// Per-attempt timeout.
    pub fn per_vote_timeout(mut self, timeout: Duration) -> Self {
        self.per_vote_timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Total collection attempts per participant.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Confidence calibration factor.
    pub fn calibration(mut self, calibration: f64) -> Self {
        self.calibration = calibration;
        self
    }

    /// Validate and produce the question.
    pub fn build(self) -> Result<ConsensusQuestion> {
        let required_quorum = self.required_quorum.unwrap_or(self.participants.len());
        let question = ConsensusQuestion {
            question_id: self
                .question_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            prompt: self.prompt,
            context: self.context,
            participants: self.participants,
            required_quorum,
            per_vote_timeout_ms: self.per_vote_timeout_ms,
            max_retries: self.max_retries,
            calibration: self.calibration,
        };
        question.validate()?;
        Ok(question)
    }
}
