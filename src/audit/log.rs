//! Append-only audit log.
//!
//! All appends go through one write lock, so concurrent questions never
//! interleave their records or lose a write. Exports take the read lock and
//! see every append that finished before they started.

use crate::audit::filter::AuditFilter;
use crate::audit::record::AuditRecord;
use crate::consensus::{ConsensusQuestion, ConsensusResult};
use crate::core::{now, Error, Hash256, Result};
use crate::orchestrator::ParticipantOutcome;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Outcome of a chain verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// Whether every record checked out
    pub is_valid: bool,
    /// Records examined
    pub checked: usize,
    /// Sequence of the first bad record
    pub first_invalid: Option<u64>,
    pub message: String,
}

/// Append-only record of every question and its result.
#[derive(Debug, Default)]
pub struct AuditLog {
    records: RwLock<Vec<AuditRecord>>,
}

impl AuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    // Records are never mutated in place, so a panic in another holder
    // cannot leave them half-written.
    fn read(&self) -> RwLockReadGuard<'_, Vec<AuditRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<AuditRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record for a question.
    ///
    /// Fails only if the record cannot be encoded for hashing; nothing is
    /// appended in that case.
    pub fn append(
        &self,
        question: ConsensusQuestion,
        result: ConsensusResult,
        participants: Vec<ParticipantOutcome>,
    ) -> Result<AuditRecord> {
        self.push(question, result, participants, None)
    }

    /// Append a record correcting an earlier question.
    ///
    /// Fails if nothing was recorded under `supersedes`.
    pub fn append_correction(
        &self,
        supersedes: &str,
        question: ConsensusQuestion,
        result: ConsensusResult,
        participants: Vec<ParticipantOutcome>,
    ) -> Result<AuditRecord> {
        let mut records = self.write();
        if !records.iter().any(|r| r.question_id() == supersedes) {
            return Err(Error::Internal(format!(
                "no audit record for question {} to correct",
                supersedes
            )));
        }
        Self::push_locked(
            &mut records,
            question,
            result,
            participants,
            Some(supersedes.to_string()),
        )
    }

    fn push(
        &self,
        question: ConsensusQuestion,
        result: ConsensusResult,
        participants: Vec<ParticipantOutcome>,
        supersedes: Option<String>,
    ) -> Result<AuditRecord> {
        let mut records = self.write();
        Self::push_locked(&mut records, question, result, participants, supersedes)
    }

    fn push_locked(
        records: &mut Vec<AuditRecord>,
        question: ConsensusQuestion,
        result: ConsensusResult,
        participants: Vec<ParticipantOutcome>,
        supersedes: Option<String>,
    ) -> Result<AuditRecord> {
        let prev_hash = records
            .last()
            .map(|r| r.hash.clone())
            .unwrap_or_else(Hash256::zero);

        let mut record = AuditRecord {
            sequence: records.len() as u64,
            recorded_at: now(),
            question,
            result,
            participants,
            supersedes,
            prev_hash,
            hash: Hash256::zero(),
        };
        record.hash = record.compute_hash()?;

        info!(
            sequence = record.sequence,
            question_id = %record.question_id(),
            status = %record.result.status,
            correction = record.supersedes.is_some(),
            "Audit record appended"
        );

        records.push(record.clone());
        Ok(record)
    }

    /// Records matching `filter`, in append order.
    pub fn export(&self, filter: &AuditFilter) -> Vec<AuditRecord> {
        let records = self.read();
        let matching = records.iter().filter(|r| filter.matches(r)).cloned();
        match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }

    /// Every record for a question ID, corrections included.
    pub fn records_for(&self, question_id: &str) -> Vec<AuditRecord> {
        self.read()
            .iter()
            .filter(|r| r.question_id() == question_id || r.supersedes.as_deref() == Some(question_id))
            .cloned()
            .collect()
    }

    /// The most recent record for a question, following corrections.
    pub fn latest_for(&self, question_id: &str) -> Option<AuditRecord> {
        self.records_for(question_id).pop()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Check every record's hash and its link to the previous record.
    pub fn verify_chain(&self) -> ChainVerification {
        let records = self.read();
        let mut expected_prev = Hash256::zero();

        for (index, record) in records.iter().enumerate() {
            let problem = if record.sequence != index as u64 {
                Some(format!("sequence {} at position {}", record.sequence, index))
            } else if record.prev_hash != expected_prev {
                Some("previous-hash link broken".to_string())
            } else if !record.verify_hash() {
                Some("content hash mismatch".to_string())
            } else {
                None
            };

            if let Some(problem) = problem {
                debug!(sequence = record.sequence, %problem, "Audit chain verification failed");
                return ChainVerification {
                    is_valid: false,
                    checked: index + 1,
                    first_invalid: Some(record.sequence),
                    message: problem,
                };
            }
            expected_prev = record.hash.clone();
        }

        ChainVerification {
            is_valid: true,
            checked: records.len(),
            first_invalid: None,
            message: "Audit chain verified".to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn tamper(&self, sequence: usize, f: impl FnOnce(&mut AuditRecord)) {
        f(&mut self.write()[sequence]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{compute_consensus, ConsensusStatus, Decision};
    use std::sync::Arc;

    fn entry(id: &str, status: ConsensusStatus) -> (ConsensusQuestion, ConsensusResult) {
        let question = ConsensusQuestion::builder("?")
            .id(id)
            .participant("a")
            .build()
            .unwrap();
        let result =
            ConsensusResult::from_tally(id, status, compute_consensus(&[], 1.0), vec![], vec![], 0);
        (question, result)
    }

    fn append(log: &AuditLog, id: &str, status: ConsensusStatus) -> AuditRecord {
        let (question, result) = entry(id, status);
        log.append(question, result, vec![]).unwrap()
    }

    #[test]
    fn test_append_and_export_in_order() {
        let log = AuditLog::new();
        assert!(log.is_empty());

        append(&log, "q-1", ConsensusStatus::Decided);
        append(&log, "q-2", ConsensusStatus::InsufficientQuorum);
        append(&log, "q-3", ConsensusStatus::Decided);

        let all = log.export(&AuditFilter::new());
        let ids: Vec<_> = all.iter().map(|r| r.question_id()).collect();
        assert_eq!(ids, vec!["q-1", "q-2", "q-3"]);
        assert_eq!(all[2].sequence, 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_export_filter_and_limit() {
        let log = AuditLog::new();
        append(&log, "wf-a/1", ConsensusStatus::Decided);
        append(&log, "other", ConsensusStatus::Decided);
        append(&log, "wf-a/2", ConsensusStatus::Decided);
        append(&log, "wf-a/3", ConsensusStatus::Decided);

        let records = log.export(&AuditFilter::new().by_prefix("wf-a/").with_limit(2));
        let ids: Vec<_> = records.iter().map(|r| r.question_id()).collect();
        assert_eq!(ids, vec!["wf-a/1", "wf-a/2"]);
    }

    #[test]
    fn test_chain_links() {
        let log = AuditLog::new();
        let first = append(&log, "q-1", ConsensusStatus::Decided);
        let second = append(&log, "q-2", ConsensusStatus::Decided);

        assert_eq!(first.prev_hash, Hash256::zero());
        assert_eq!(second.prev_hash, first.hash);

        let verification = log.verify_chain();
        assert!(verification.is_valid);
        assert_eq!(verification.checked, 2);
    }

    #[test]
    fn test_verify_detects_tampering() {
        let log = AuditLog::new();
        append(&log, "q-1", ConsensusStatus::InsufficientQuorum);
        append(&log, "q-2", ConsensusStatus::Decided);

        log.tamper(0, |r| r.result.final_decision = Some(Decision::Yes));

        let verification = log.verify_chain();
        assert!(!verification.is_valid);
        assert_eq!(verification.first_invalid, Some(0));
    }

    #[test]
    fn test_corrections() {
        let log = AuditLog::new();
        append(&log, "q-1", ConsensusStatus::InsufficientQuorum);

        let (question, result) = entry("q-1-rerun", ConsensusStatus::Decided);
        let correction = log.append_correction("q-1", question, result, vec![]).unwrap();
        assert_eq!(correction.supersedes.as_deref(), Some("q-1"));

        let history = log.records_for("q-1");
        assert_eq!(history.len(), 2);
        assert_eq!(
            log.latest_for("q-1").unwrap().result.status,
            ConsensusStatus::Decided
        );
        assert!(log.verify_chain().is_valid);
    }

    #[test]
    fn test_correction_requires_existing_record() {
        let log = AuditLog::new();
        let (question, result) = entry("q-9", ConsensusStatus::Decided);
        assert!(log.append_correction("missing", question, result, vec![]).is_err());
        assert!(log.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_lose_nothing() {
        let log = Arc::new(AuditLog::new());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    append(&log, &format!("q-{}", i), ConsensusStatus::Decided);
                })
            })
            .collect();
        for result in futures::future::join_all(handles).await {
            result.unwrap();
        }

        assert_eq!(log.len(), 64);
        let records = log.export(&AuditFilter::new());
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.sequence, i as u64);
        }
        assert!(log.verify_chain().is_valid);
    }
}
