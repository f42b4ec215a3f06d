//! Orchestrator configuration.

use crate::consensus::engine::DEFAULT_SUMMARY_MAX_CHARS;
use crate::core::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff between collection attempts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt
    pub base_backoff_ms: u64,
    /// Ceiling for any single delay
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Delay after the attempt with 0-based index `attempt` failed:
    /// `base × 2^attempt`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = self.base_backoff_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_backoff_ms))
    }

    /// No waiting between attempts.
    pub fn immediate() -> Self {
        Self {
            base_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }
}

impl Default for RetryPolicy {
    /// 100ms base, 5s cap.
    fn default() -> Self {
        Self {
            base_backoff_ms: 100,
            max_backoff_ms: 5_000,
        }
    }
}

/// Orchestrator configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Participants collected at once (unbounded when `None`)
    pub max_concurrency: Option<usize>,
    /// Backoff between attempts
    pub retry: RetryPolicy,
    /// Overall per-question deadline applied to every `submit`
    pub overall_deadline_ms: Option<u64>,
    /// Cap on the reasoning summary, in characters
    pub summary_max_chars: usize,
}

impl OrchestratorConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Bound concurrent collections.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max.max(1));
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set a default overall deadline.
    pub fn with_overall_deadline(mut self, deadline: Duration) -> Self {
        self.overall_deadline_ms = Some(deadline.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    /// Set the summary cap.
    pub fn with_summary_limit(mut self, max_chars: usize) -> Self {
        self.summary_max_chars = max_chars;
        self
    }

    /// Default overall deadline as a duration.
    pub fn overall_deadline(&self) -> Option<Duration> {
        self.overall_deadline_ms.map(Duration::from_millis)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            retry: RetryPolicy::default(),
            overall_deadline_ms: None,
            summary_max_chars: DEFAULT_SUMMARY_MAX_CHARS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(6), Duration::from_millis(5_000));
        assert_eq!(policy.backoff(200), Duration::from_millis(5_000));
    }

    #[test]
    fn test_immediate_policy() {
        assert_eq!(RetryPolicy::immediate().backoff(3), Duration::ZERO);
    }

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert!(config.max_concurrency.is_none());
        assert!(config.overall_deadline().is_none());
        assert_eq!(config.summary_max_chars, DEFAULT_SUMMARY_MAX_CHARS);
    }

    #[test]
    fn test_from_json_partial() {
        let config = OrchestratorConfig::from_json(
            r#"{"max_concurrency": 4, "retry": {"base_backoff_ms": 50}}"#,
        )
        .unwrap();
        assert_eq!(config.max_concurrency, Some(4));
        assert_eq!(config.retry.base_backoff_ms, 50);
        assert_eq!(config.retry.max_backoff_ms, 5_000);
        assert!(config.overall_deadline_ms.is_none());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(OrchestratorConfig::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_builders() {
        let config = OrchestratorConfig::default()
            .with_max_concurrency(0)
            .with_overall_deadline(Duration::from_secs(2))
            .with_retry(RetryPolicy::immediate());
        assert_eq!(config.max_concurrency, Some(1));
        assert_eq!(config.overall_deadline(), Some(Duration::from_secs(2)));
        assert_eq!(config.retry, RetryPolicy::immediate());
    }
}
