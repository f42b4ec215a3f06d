//! Consensus results.

use crate::consensus::engine::Tally;
use crate::consensus::vote::{Decision, Vote, VoteBreakdown};
use serde::{Deserialize, Serialize};

/// Outcome category of a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsensusStatus {
    /// Quorum met; the final decision is meaningful
    Decided,
    /// Fewer valid votes than the required quorum
    InsufficientQuorum,
    /// Cancelled by the caller before collection finished.
    ///
    /// This takes precedence over the quorum gate: an aborted question has no
    /// decision even when the votes that did arrive would have met quorum.
    Aborted,
}

impl std::fmt::Display for ConsensusStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsensusStatus::Decided => write!(f, "DECIDED"),
            ConsensusStatus::InsufficientQuorum => write!(f, "INSUFFICIENT_QUORUM"),
            ConsensusStatus::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// Result of one consensus question.
///
/// `final_decision` is `Some` only when `status` is [`ConsensusStatus::Decided`].
/// The score fields are still filled for other statuses as diagnostics.
///
/// A result that was not cancelled is `Decided` exactly when
/// `votes_received.len() >= required_quorum`. A cancelled one is always
/// [`ConsensusStatus::Aborted`], whatever the vote count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub question_id: String,
    pub status: ConsensusStatus,
    pub final_decision: Option<Decision>,
    pub weighted_score: f64,
    pub confidence_level: f64,
    pub vote_breakdown: VoteBreakdown,
    pub votes_received: Vec<Vote>,
    pub votes_missing: Vec<String>,
    pub reasoning_summary: String,
    pub duration_ms: u64,
    /// Calibrated weight behind YES
    pub pro_weight: f64,
    /// Calibrated weight behind NO
    pub con_weight: f64,
}

impl ConsensusResult {
    /// Assemble a result from a tally.
    ///
    /// The decision is dropped unless `status` is `Decided`.
    pub fn from_tally(
        question_id: &str,
        status: ConsensusStatus,
        tally: Tally,
        votes_received: Vec<Vote>,
        votes_missing: Vec<String>,
        duration_ms: u64,
    ) -> Self {
        let final_decision = match status {
            ConsensusStatus::Decided => Some(tally.final_decision),
            ConsensusStatus::InsufficientQuorum | ConsensusStatus::Aborted => None,
        };

        Self {
            question_id: question_id.to_string(),
            status,
            final_decision,
            weighted_score: tally.weighted_score,
            confidence_level: tally.confidence_level,
            vote_breakdown: tally.breakdown,
            votes_received,
            votes_missing,
            reasoning_summary: tally.reasoning_summary,
            duration_ms,
            pro_weight: tally.pro_weight,
            con_weight: tally.con_weight,
        }
    }

    /// Whether quorum was met.
    pub fn is_decided(&self) -> bool {
        self.status == ConsensusStatus::Decided
    }

    /// One-line human-readable report.
    pub fn summary_line(&self) -> String {
        let decision = match self.final_decision {
            Some(decision) => decision.to_string(),
            None => self.status.to_string(),
        };

        format!(
            "Decision: {} | Weighted score: {:.2} | Unanimity: {:.1}% | Pro ({:.2}): {} agents | Con ({:.2}): {} agents | Missing: {}",
            decision,
            self.weighted_score,
            self.confidence_level * 100.0,
            self.pro_weight,
            self.vote_breakdown.yes,
            self.con_weight,
            self.vote_breakdown.no,
            self.votes_missing.len()
        )
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> crate::core::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl std::fmt::Display for ConsensusResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary_line())
    }
}
