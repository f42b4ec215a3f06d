//! # verdict - Confidence-Weighted Multi-Agent Consensus
//!
//! Turns the opinions of several agents into one audited decision:
//! - **Consensus**: votes, questions and the weighted tally
//! - **Orchestrator**: concurrent vote collection with timeout, retry and quorum
//! - **Workflow**: sequential rounds that build on earlier decisions
//! - **Audit**: hash-chained, append-only decision log with export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verdict::collector::{VoteCollector, VoteResponse};
//! use verdict::consensus::ConsensusQuestion;
//! use verdict::orchestrator::Orchestrator;
//!
//! struct Panel;
//!
//! #[async_trait::async_trait]
//! impl VoteCollector for Panel {
//!     async fn collect(
//!         &self,
//!         participant_id: &str,
//!         _question: &ConsensusQuestion,
//!     ) -> verdict::Result<VoteResponse> {
//!         Ok(VoteResponse::new(participant_id, "YES", 0.8).with_reasoning("looks right"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> verdict::Result<()> {
//!     verdict::core::init_tracing("info");
//!
//!     let question = ConsensusQuestion::builder("Ship the release today?")
//!         .participants(["qa", "release", "security"])
//!         .required_quorum(2)
//!         .build()?;
//!
//!     let orchestrator = Orchestrator::new(Panel);
//!     let result = orchestrator.submit(question).await?;
//!     println!("{}", result.summary_line());
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod collector;
pub mod consensus;
pub mod core;
pub mod orchestrator;
pub mod workflow;

pub use core::error::{Error, Result};
