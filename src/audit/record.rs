//! Audit record structure.
//!
//! One record per submitted question: the question as asked, the result, and
//! every participant's collection outcome, malformed replies included.
//! Records are chained by hash in append order.

use crate::consensus::{ConsensusQuestion, ConsensusResult};
use crate::core::{Hash256, Result, Timestamp};
use crate::orchestrator::ParticipantOutcome;
use serde::{Deserialize, Serialize};

/// An immutable audit record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Position in the log, starting at 0
    pub sequence: u64,
    /// When the record was appended
    pub recorded_at: Timestamp,
    /// The question as submitted
    pub question: ConsensusQuestion,
    /// The result returned to the caller
    pub result: ConsensusResult,
    /// Per-participant collection outcomes
    pub participants: Vec<ParticipantOutcome>,
    /// Question ID this record corrects, if any
    pub supersedes: Option<String>,
    /// Hash of the previous record (zero for the first)
    pub prev_hash: Hash256,
    /// Hash of this record's content and `prev_hash`
    pub hash: Hash256,
}

#[derive(Serialize)]
struct HashedContent<'a> {
    sequence: u64,
    recorded_at: &'a Timestamp,
    question: &'a ConsensusQuestion,
    result: &'a ConsensusResult,
    participants: &'a [ParticipantOutcome],
    supersedes: Option<&'a str>,
    prev_hash: &'a Hash256,
}

impl AuditRecord {
    /// ID of the recorded question.
    pub fn question_id(&self) -> &str {
        &self.question.question_id
    }

    /// Hash over every field except `hash` itself.
    ///
    /// The content is hashed in its JSON encoding, which escapes strings and
    /// keeps field order fixed, so re-importing an exported record
    /// reproduces the same bytes.
    pub fn compute_hash(&self) -> Result<Hash256> {
        let content = HashedContent {
            sequence: self.sequence,
            recorded_at: &self.recorded_at,
            question: &self.question,
            result: &self.result,
            participants: &self.participants,
            supersedes: self.supersedes.as_deref(),
            prev_hash: &self.prev_hash,
        };
        let bytes = serde_json::to_vec(&content)?;
        Ok(Hash256::digest(&[bytes.as_slice()]))
    }

    /// Whether the stored hash matches the content.
    pub fn verify_hash(&self) -> bool {
        matches!(self.compute_hash(), Ok(hash) if hash == self.hash)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::VoteResponse;
    use crate::consensus::{ConsensusEngine, ConsensusStatus, Decision, Vote};
    use crate::core::{now, Error};
    use crate::orchestrator::ParticipantTracker;

    fn sealed(mut record: AuditRecord) -> AuditRecord {
        record.hash = record.compute_hash().unwrap();
        record
    }

    fn record_with(id: &str, prompt: &str, confidences: &[f64], calibration: f64) -> AuditRecord {
        let decisions = [Decision::Yes, Decision::No, Decision::Abstain];
        let participants: Vec<String> = (0..confidences.len() + 1).map(|i| format!("p{}", i)).collect();
        let question = ConsensusQuestion::builder(prompt)
            .id(id)
            .participants(participants.clone())
            .required_quorum(confidences.len().max(1))
            .calibration(calibration)
            .build()
            .unwrap();

        let votes: Vec<Vote> = confidences
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Vote::new(&participants[i], decisions[i % 3], *c, format!("reason {}", i), now()).unwrap()
            })
            .collect();
        let mut outcomes: Vec<ParticipantOutcome> = votes
            .iter()
            .map(|v| {
                let mut tracker = ParticipantTracker::new(v.participant_id(), 1);
                tracker.begin_attempt();
                tracker.record_success(v.clone());
                tracker.into_outcome()
            })
            .collect();
        let silent = participants.last().unwrap();
        let mut tracker = ParticipantTracker::new(silent, 1);
        tracker.begin_attempt();
        tracker.record_failure(
            &Error::MalformedVote("confidence 1.3".to_string()),
            Some(VoteResponse::new(silent.as_str(), "YES", 1.3)),
        );
        outcomes.push(tracker.into_outcome());

        let tally = ConsensusEngine::new(calibration).tally(&votes);
        let result = ConsensusResult::from_tally(
            id,
            ConsensusStatus::Decided,
            tally,
            votes,
            vec![silent.clone()],
            42,
        );

        sealed(AuditRecord {
            sequence: 0,
            recorded_at: now(),
            question,
            result,
            participants: outcomes,
            supersedes: None,
            prev_hash: Hash256::zero(),
            hash: Hash256::zero(),
        })
    }

    fn record() -> AuditRecord {
        record_with("q-1", "Deploy?", &[0.95, 0.92, 0.60, 0.70, 0.50], 0.85)
    }

    #[test]
    fn test_hash_verifies() {
        let record = record();
        assert!(record.verify_hash());
        assert_eq!(record.question_id(), "q-1");
    }

    #[test]
    fn test_tampering_result_breaks_hash() {
        let mut tampered = record();
        tampered.result.final_decision = Some(Decision::No);
        assert!(!tampered.verify_hash());

        let mut tampered = record();
        tampered.result.reasoning_summary = "forged".to_string();
        assert!(!tampered.verify_hash());

        let mut tampered = record();
        tampered.result.duration_ms += 1;
        assert!(!tampered.verify_hash());
    }

    #[test]
    fn test_tampering_question_policy_breaks_hash() {
        let mut tampered = record();
        tampered.question.required_quorum -= 1;
        assert!(!tampered.verify_hash());

        let mut tampered = record();
        tampered.question.calibration = 2.0;
        assert!(!tampered.verify_hash());

        let mut tampered = record();
        tampered.question.max_retries += 1;
        assert!(!tampered.verify_hash());
    }

    #[test]
    fn test_tampering_votes_breaks_hash() {
        let mut tampered = record();
        let original = tampered.result.votes_received[0].clone();
        tampered.result.votes_received[0] = Vote::new(
            original.participant_id(),
            original.decision(),
            original.confidence(),
            "rewritten reasoning",
            original.received_at(),
        )
        .unwrap();
        assert!(!tampered.verify_hash());
    }

    #[test]
    fn test_tampering_participants_breaks_hash() {
        let mut tampered = record();
        tampered.participants.last_mut().unwrap().failures.clear();
        assert!(!tampered.verify_hash());

        let mut tampered = record();
        tampered.participants.last_mut().unwrap().malformed_response = None;
        assert!(!tampered.verify_hash());
    }

    #[test]
    fn test_tampering_chain_link_breaks_hash() {
        let mut tampered = record();
        tampered.prev_hash = Hash256::digest(&[b"other"]);
        assert!(!tampered.verify_hash());
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        let mut first = record_with("x", "y:z", &[0.5], 1.0);
        let mut second = record_with("x:y", "z", &[0.5], 1.0);
        second.recorded_at = first.recorded_at;
        second.result = first.result.clone();
        second.participants = first.participants.clone();
        first.hash = first.compute_hash().unwrap();
        second.hash = second.compute_hash().unwrap();
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn test_json_roundtrip_keeps_hash_valid() {
        let calibrations = [0.85, 0.3, 1.0, 1.7, 2.0];
        let confidence_sets: [&[f64]; 4] = [
            &[0.95, 0.92, 0.60, 0.70, 0.50],
            &[0.1, 0.2, 0.7],
            &[0.33, 0.67, 0.01, 0.99],
            &[1.0 / 3.0, 2.0 / 7.0, 0.83 / 3.67],
        ];

        for calibration in calibrations {
            for confidences in confidence_sets {
                let record = record_with("q-rt", "Ship?", confidences, calibration);
                let parsed = AuditRecord::from_json(&record.to_json().unwrap()).unwrap();

                assert_eq!(
                    parsed.result.weighted_score.to_bits(),
                    record.result.weighted_score.to_bits()
                );
                assert_eq!(parsed, record);
                assert!(parsed.verify_hash(), "calibration {calibration}, {confidences:?}");
            }
        }
    }
}
