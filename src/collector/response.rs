//! Raw vote responses and the validation boundary.

use crate::consensus::vote::{Decision, Vote};
use crate::core::{Error, Result, Timestamp};
use serde::{Deserialize, Serialize};

/// A participant's reply as received, before validation.
///
/// Nothing here is trusted: the decision is free text and the confidence may
/// be out of range. [`VoteResponse::validate`] is the only way to turn one
/// into a [`Vote`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoteResponse {
    /// Who the reply claims to come from
    pub participant_id: String,
    /// Decision tag, expected to be YES / NO / ABSTAIN
    pub decision: String,
    /// Claimed confidence, expected in [0, 1]
    pub confidence: f64,
    /// Free-text justification
    #[serde(default)]
    pub reasoning: String,
}

impl VoteResponse {
    /// Create a response.
    pub fn new(
        participant_id: impl Into<String>,
        decision: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            decision: decision.into(),
            confidence,
            reasoning: String::new(),
        }
    }

    /// Add reasoning.
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Validate into a [`Vote`] for `expected_participant`.
    ///
    /// Fails with [`Error::MalformedVote`] on an unknown decision tag, an
    /// out-of-range confidence, or a reply attributed to someone else.
    pub fn validate(&self, expected_participant: &str, received_at: Timestamp) -> Result<Vote> {
        if self.participant_id != expected_participant {
            return Err(Error::MalformedVote(format!(
                "reply for {} attributed to {}",
                expected_participant, self.participant_id
            )));
        }

        let decision: Decision = self.decision.parse()?;
        Vote::new(
            self.participant_id.clone(),
            decision,
            self.confidence,
            self.reasoning.clone(),
            received_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::now;

    #[test]
    fn test_valid_response() {
        let vote = VoteResponse::new("agent-1", "yes", 0.7)
            .with_reasoning("looks right")
            .validate("agent-1", now())
            .unwrap();

        assert_eq!(vote.decision(), Decision::Yes);
        assert_eq!(vote.confidence(), 0.7);
        assert_eq!(vote.reasoning(), "looks right");
    }

    #[test]
    fn test_rejects_unknown_decision() {
        let err = VoteResponse::new("agent-1", "PROBABLY", 0.7)
            .validate("agent-1", now())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedVote(_)));
    }

    #[test]
    fn test_rejects_out_of_range_confidence() {
        let err = VoteResponse::new("agent-1", "NO", 1.5)
            .validate("agent-1", now())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedVote(_)));
    }

    #[test]
    fn test_rejects_misattributed_reply() {
        let err = VoteResponse::new("agent-2", "NO", 0.5)
            .validate("agent-1", now())
            .unwrap_err();
        assert!(err.to_string().contains("attributed to agent-2"));
    }

    #[test]
    fn test_deserialize_without_reasoning() {
        let json = r#"{"participant_id":"a","decision":"ABSTAIN","confidence":0.2}"#;
        let response: VoteResponse = serde_json::from_str(json).unwrap();
        assert!(response.reasoning.is_empty());
    }
}
