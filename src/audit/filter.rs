//! Export filters for audit records.

use crate::audit::record::AuditRecord;
use crate::consensus::ConsensusStatus;
use crate::core::Timestamp;
use serde::{Deserialize, Serialize};

/// Filter for exporting audit records.
///
/// Time bounds are exclusive and apply to `recorded_at`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Keep question IDs starting with this prefix
    pub question_id_prefix: Option<String>,
    /// Keep records appended strictly after this instant
    pub after: Option<Timestamp>,
    /// Keep records appended strictly before this instant
    pub before: Option<Timestamp>,
    /// Keep records with this result status
    pub status: Option<ConsensusStatus>,
    /// Maximum results
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by question ID prefix.
    pub fn by_prefix(mut self, prefix: &str) -> Self {
        self.question_id_prefix = Some(prefix.to_string());
        self
    }

    /// Keep records appended after `instant`.
    pub fn after(mut self, instant: Timestamp) -> Self {
        self.after = Some(instant);
        self
    }

    /// Keep records appended before `instant`.
    pub fn before(mut self, instant: Timestamp) -> Self {
        self.before = Some(instant);
        self
    }

    /// Filter by status.
    pub fn by_status(mut self, status: ConsensusStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if a record matches this filter (ignores `limit`).
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(prefix) = &self.question_id_prefix {
            if !record.question_id().starts_with(prefix.as_str()) {
                return false;
            }
        }

        if let Some(after) = self.after {
            if record.recorded_at <= after {
                return false;
            }
        }

        if let Some(before) = self.before {
            if record.recorded_at >= before {
                return false;
            }
        }

        if let Some(status) = self.status {
            if record.result.status != status {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{compute_consensus, ConsensusQuestion, ConsensusResult};
    use crate::core::Hash256;
    use chrono::Duration;

    fn record(id: &str, status: ConsensusStatus, recorded_at: Timestamp) -> AuditRecord {
        let question = ConsensusQuestion::builder("?")
            .id(id)
            .participant("a")
            .build()
            .unwrap();
        let result =
            ConsensusResult::from_tally(id, status, compute_consensus(&[], 1.0), vec![], vec![], 0);
        AuditRecord {
            sequence: 0,
            recorded_at,
            question,
            result,
            participants: vec![],
            supersedes: None,
            prev_hash: Hash256::zero(),
            hash: Hash256::zero(),
        }
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let rec = record("q-1", ConsensusStatus::Decided, crate::core::now());
        assert!(AuditFilter::new().matches(&rec));
    }

    #[test]
    fn test_prefix() {
        let rec = record("wf-7/round-1", ConsensusStatus::Decided, crate::core::now());
        assert!(AuditFilter::new().by_prefix("wf-7/").matches(&rec));
        assert!(!AuditFilter::new().by_prefix("wf-8/").matches(&rec));
    }

    #[test]
    fn test_time_bounds_are_exclusive() {
        let t = crate::core::now();
        let rec = record("q", ConsensusStatus::Decided, t);

        assert!(!AuditFilter::new().after(t).matches(&rec));
        assert!(!AuditFilter::new().before(t).matches(&rec));
        assert!(AuditFilter::new()
            .after(t - Duration::seconds(1))
            .before(t + Duration::seconds(1))
            .matches(&rec));
    }

    #[test]
    fn test_status() {
        let rec = record("q", ConsensusStatus::InsufficientQuorum, crate::core::now());
        assert!(AuditFilter::new()
            .by_status(ConsensusStatus::InsufficientQuorum)
            .matches(&rec));
        assert!(!AuditFilter::new().by_status(ConsensusStatus::Decided).matches(&rec));
    }

    #[test]
    fn test_filter_chain() {
        let filter = AuditFilter::new().by_prefix("tool_").with_limit(10);
        assert_eq!(filter.question_id_prefix.as_deref(), Some("tool_"));
        assert_eq!(filter.limit, Some(10));
    }
}
