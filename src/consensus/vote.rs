//! Vote model.
//!
//! A [`Vote`] is one participant's validated opinion on one question. Votes
//! can only be built through [`Vote::new`], which enforces the confidence
//! range, so anything holding a `Vote` may rely on it. Deserialization goes
//! through the same check.

use crate::core::{Error, Result, Timestamp};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The three decisions a participant can cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// In favour of the proposal
    Yes,
    /// Against the proposal
    No,
    /// No opinion; carries weight but no direction
    Abstain,
}

impl Decision {
    /// Signed value used by the weighted sum.
    pub fn value(self) -> f64 {
        match self {
            Decision::Yes => 1.0,
            Decision::No => -1.0,
            Decision::Abstain => 0.0,
        }
    }

    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Yes => "YES",
            Decision::No => "NO",
            Decision::Abstain => "ABSTAIN",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" => Ok(Decision::Yes),
            "NO" => Ok(Decision::No),
            "ABSTAIN" => Ok(Decision::Abstain),
            other => Err(Error::MalformedVote(format!(
                "unknown decision '{}'",
                other
            ))),
        }
    }
}

/// A single validated vote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedVote")]
pub struct Vote {
    participant_id: String,
    decision: Decision,
    confidence: f64,
    reasoning: String,
    received_at: Timestamp,
}

impl Vote {
    /// Create a vote, rejecting a confidence outside `[0, 1]`.
    pub fn new(
        participant_id: impl Into<String>,
        decision: Decision,
        confidence: f64,
        reasoning: impl Into<String>,
        received_at: Timestamp,
    ) -> Result<Self> {
        let participant_id = participant_id.into();
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(Error::MalformedVote(format!(
                "confidence {} from {} outside [0, 1]",
                confidence, participant_id
            )));
        }

        Ok(Self {
            participant_id,
            decision,
            confidence,
            reasoning: reasoning.into(),
            received_at,
        })
    }

    /// Who cast the vote.
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Self-reported confidence, within `[0, 1]`.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Free-text justification; may be empty.
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// When the orchestrator accepted the reply.
    pub fn received_at(&self) -> Timestamp {
        self.received_at
    }
}

/// Wire shape of a [`Vote`] before validation.
#[derive(Deserialize)]
struct UncheckedVote {
    participant_id: String,
    decision: Decision,
    confidence: f64,
    reasoning: String,
    received_at: Timestamp,
}

impl TryFrom<UncheckedVote> for Vote {
    type Error = Error;

    fn try_from(raw: UncheckedVote) -> Result<Self> {
        Vote::new(
            raw.participant_id,
            raw.decision,
            raw.confidence,
            raw.reasoning,
            raw.received_at,
        )
    }
}

/// Count of votes per decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteBreakdown {
    pub yes: usize,
    pub no: usize,
    pub abstain: usize,
}

impl VoteBreakdown {
    /// Tally decisions from a vote list.
    pub fn from_votes(votes: &[Vote]) -> Self {
        let mut breakdown = Self::default();
        for vote in votes {
            match vote.decision {
                Decision::Yes => breakdown.yes += 1,
                Decision::No => breakdown.no += 1,
                Decision::Abstain => breakdown.abstain += 1,
            }
        }
        breakdown
    }

    /// Total votes counted.
    pub fn total(&self) -> usize {
        self.yes + self.no + self.abstain
    }
}
