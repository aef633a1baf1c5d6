//! Logging setup and per-run bookkeeping

use crate::types::{RunId, TokenUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. `json` switches to one JSON object per line.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// Counters for one survey run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run identifier
    pub run_id: RunId,
    /// Which driver produced the run
    pub variant: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: Option<DateTime<Utc>>,
    /// Units (profiles or iterations) completed in this run
    pub units_completed: usize,
    /// Records produced in this run
    pub records: usize,
    /// Replies without a braced rate
    pub parse_misses: usize,
    /// Snapshots that could not be written
    pub failed_saves: usize,
    /// Aggregate token usage reported by the service
    pub tokens: TokenUsage,
}

impl RunSummary {
    /// Start a summary for `variant`
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            run_id: RunId::new(),
            variant: variant.into(),
            started_at: Utc::now(),
            finished_at: None,
            units_completed: 0,
            records: 0,
            parse_misses: 0,
            failed_saves: 0,
            tokens: TokenUsage::default(),
        }
    }

    /// Count one answered query
    pub fn record_answer(&mut self, parsed: bool, usage: TokenUsage) {
        self.records += 1;
        if !parsed {
            self.parse_misses += 1;
        }
        self.tokens.add(usage);
    }

    /// Count a finished unit of work
    pub fn unit_done(&mut self) {
        self.units_completed += 1;
    }

    /// Count a snapshot that failed to write
    pub fn save_failed(&mut self) {
        self.failed_saves += 1;
    }

    /// Stamp the end time and log the totals
    pub fn finish(&mut self) {
        let finished_at = Utc::now();
        self.finished_at = Some(finished_at);

        info!(
            run_id = %self.run_id,
            variant = %self.variant,
            units = self.units_completed,
            records = self.records,
            parse_misses = self.parse_misses,
            failed_saves = self.failed_saves,
            total_tokens = self.tokens.total_tokens,
            elapsed_secs = (finished_at - self.started_at).num_seconds(),
            "run finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counters() {
        let mut summary = RunSummary::new("central-banker");
        summary.record_answer(true, TokenUsage::new(40, 4));
        summary.record_answer(false, TokenUsage::new(40, 9));
        summary.unit_done();
        summary.save_failed();
        summary.finish();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.parse_misses, 1);
        assert_eq!(summary.units_completed, 1);
        assert_eq!(summary.failed_saves, 1);
        assert_eq!(summary.tokens.total_tokens, 93);
        assert!(summary.finished_at.unwrap() >= summary.started_at);
    }
}
