//! Orchestration
//!
//! Concurrent vote collection and the path from question to audited result:
//! - Per-participant state machine with timeout, retry and backoff
//! - Quorum gate, overall deadline and cancellation
//! - Offline vote injection

pub mod config;
#[allow(clippy::module_inception)]
pub mod orchestrator;
pub mod participant;

pub use config::{OrchestratorConfig, RetryPolicy};
pub use orchestrator::Orchestrator;
pub use participant::{
    AttemptFailure, FailureKind, ParticipantOutcome, ParticipantState, ParticipantTracker,
};
