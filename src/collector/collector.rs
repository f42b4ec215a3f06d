//! VoteCollector trait definition.
//!
//! The capability the orchestrator calls once per participant attempt. How
//! a participant actually forms its opinion (model call, human prompt, rule
//! engine) is up to the implementation.

use crate::collector::response::VoteResponse;
use crate::consensus::question::ConsensusQuestion;
use crate::core::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Source of participant votes.
///
/// Implementations report transient trouble (dropped connection, rate
/// limit) as [`Error::VoteCollection`] so the orchestrator retries it. Any
/// other error ends the participant's attempts for that question. Timeouts
/// are enforced by the orchestrator; implementations need not impose their
/// own.
#[async_trait]
pub trait VoteCollector: Send + Sync {
    /// Obtain one participant's reply to `question`.
    async fn collect(&self, participant_id: &str, question: &ConsensusQuestion)
        -> Result<VoteResponse>;
}

#[async_trait]
impl<T: VoteCollector + ?Sized> VoteCollector for Arc<T> {
    async fn collect(
        &self,
        participant_id: &str,
        question: &ConsensusQuestion,
    ) -> Result<VoteResponse> {
        (**self).collect(participant_id, question).await
    }
}

/// Adapter for synchronous collectors.
///
/// Each call runs on tokio's blocking pool. If the orchestrator gives up on
/// a call, the closure keeps running to completion and its reply is dropped.
pub struct BlockingCollector<F> {
    func: Arc<F>,
}

impl<F> BlockingCollector<F>
where
    F: Fn(&str, &ConsensusQuestion) -> Result<VoteResponse> + Send + Sync + 'static,
{
    /// Wrap a blocking function.
    pub fn new(func: F) -> Self {
        Self {
            func: Arc::new(func),
        }
    }
}

#[async_trait]
impl<F> VoteCollector for BlockingCollector<F>
where
    F: Fn(&str, &ConsensusQuestion) -> Result<VoteResponse> + Send + Sync + 'static,
{
    async fn collect(
        &self,
        participant_id: &str,
        question: &ConsensusQuestion,
    ) -> Result<VoteResponse> {
        let func = Arc::clone(&self.func);
        let participant_id = participant_id.to_string();
        let question = question.clone();

        tokio::task::spawn_blocking(move || func(&participant_id, &question))
            .await
            .map_err(|e| Error::Internal(format!("blocking collector task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> ConsensusQuestion {
        ConsensusQuestion::builder("Proceed?")
            .id("q-1")
            .participants(["alice", "bob"])
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_blocking_collector() {
        let collector = BlockingCollector::new(|participant: &str, question: &ConsensusQuestion| {
            Ok(VoteResponse::new(participant, "YES", 0.9)
                .with_reasoning(format!("answered {}", question.question_id)))
        });

        let response = collector.collect("alice", &question()).await.unwrap();
        assert_eq!(response.participant_id, "alice");
        assert_eq!(response.reasoning, "answered q-1");
    }

    #[tokio::test]
    async fn test_blocking_collector_propagates_errors() {
        let collector = BlockingCollector::new(|_: &str, _: &ConsensusQuestion| {
            Err(Error::VoteCollection("connection refused".to_string()))
        });

        let err = collector.collect("bob", &question()).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_arc_collector() {
        let collector = Arc::new(BlockingCollector::new(|p: &str, _: &ConsensusQuestion| {
            Ok(VoteResponse::new(p, "NO", 0.1))
        }));
        let response = collector.collect("bob", &question()).await.unwrap();
        assert_eq!(response.decision, "NO");
    }
}
