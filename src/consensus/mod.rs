//! Consensus Module
//!
//! Confidence-weighted decision making:
//! - Vote model with a validated confidence range
//! - Questions with quorum, timeout, retry and calibration policy
//! - Pure consensus engine and result types
//! - Prompt templates for common decision categories

pub mod engine;
pub mod question;
pub mod result;
pub mod templates;
pub mod vote;

pub use engine::{compute_consensus, ConsensusEngine, Tally};
pub use question::{ConsensusQuestion, DecisionContext, QuestionBuilder};
pub use result::{ConsensusResult, ConsensusStatus};
pub use vote::{Decision, Vote, VoteBreakdown};
