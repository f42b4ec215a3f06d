//! Confidence-weighted consensus engine.
//!
//! Each vote contributes `value × confidence × calibration` to a signed
//! score, where value is +1 for YES, -1 for NO and 0 for ABSTAIN. The sign of
//! the score picks the decision; `|score| / total weight` measures how
//! one-sided the confidence mass is. The engine is a pure function of its
//! inputs: no clock, no randomness, and summation in input order.

use crate::consensus::vote::{Decision, Vote, VoteBreakdown};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default cap on the reasoning summary, in characters.
pub const DEFAULT_SUMMARY_MAX_CHARS: usize = 280;

const SUMMARY_SEPARATOR: &str = "; ";
const TRUNCATION_MARKER: &str = "...";

/// Aggregated outcome of a vote list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    /// Signed sum of calibrated confidences
    pub weighted_score: f64,
    /// Net weight over total weight, in [0, 1]
    pub confidence_level: f64,
    /// Votes per decision
    pub breakdown: VoteBreakdown,
    /// Sign of the weighted score
    pub final_decision: Decision,
    /// Reasoning of the winning side
    pub reasoning_summary: String,
    /// Calibrated weight behind YES
    pub pro_weight: f64,
    /// Calibrated weight behind NO
    pub con_weight: f64,
}

/// Consensus engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsensusEngine {
    calibration: f64,
    summary_max_chars: usize,
}

impl ConsensusEngine {
    /// Create an engine with the given calibration.
    ///
    /// Calibration is validated when a question is built, not here.
    pub fn new(calibration: f64) -> Self {
        Self {
            calibration,
            summary_max_chars: DEFAULT_SUMMARY_MAX_CHARS,
        }
    }

    /// Cap the reasoning summary length.
    pub fn with_summary_limit(mut self, max_chars: usize) -> Self {
        self.summary_max_chars = max_chars;
        self
    }

    /// Multiplier applied to every confidence before weighting.
    pub fn calibration(&self) -> f64 {
        self.calibration
    }

    /// Aggregate votes into a tally.
    pub fn tally(&self, votes: &[Vote]) -> Tally {
        let mut weighted_score = 0.0;
        let mut total_weight = 0.0;
        let mut pro_weight = 0.0;
        let mut con_weight = 0.0;

        for vote in votes {
            let weight = vote.confidence() * self.calibration;
            weighted_score += vote.decision().value() * weight;
            total_weight += weight;
            match vote.decision() {
                Decision::Yes => pro_weight += weight,
                Decision::No => con_weight += weight,
                Decision::Abstain => {}
            }
        }

        let confidence_level = if total_weight > 0.0 {
            (weighted_score.abs() / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let final_decision = decide_from_score(weighted_score);

        Tally {
            weighted_score,
            confidence_level,
            breakdown: VoteBreakdown::from_votes(votes),
            final_decision,
            reasoning_summary: self.summarize(votes, final_decision),
            pro_weight,
            con_weight,
        }
    }

    /// Distinct reasoning of the winning side, most confident first.
    fn summarize(&self, votes: &[Vote], winner: Decision) -> String {
        let mut winning: Vec<&Vote> = votes
            .iter()
            .filter(|v| v.decision() == winner && !v.reasoning().trim().is_empty())
            .collect();
        // Stable sort keeps input order among equal confidences.
        winning.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));

        let mut seen = HashSet::new();
        let parts: Vec<&str> = winning
            .iter()
            .map(|v| v.reasoning().trim())
            .filter(|r| seen.insert(*r))
            .collect();

        truncate_chars(&parts.join(SUMMARY_SEPARATOR), self.summary_max_chars)
    }
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Aggregate votes with the default summary limit.
pub fn compute_consensus(votes: &[Vote], calibration: f64) -> Tally {
    ConsensusEngine::new(calibration).tally(votes)
}

fn decide_from_score(score: f64) -> Decision {
    if score > 0.0 {
        Decision::Yes
    } else if score < 0.0 {
        Decision::No
    } else {
        Decision::Abstain
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_len {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - marker_len).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
