//! Batch report
//!
//! JSON-serializable summary of one orchestrator run. Timestamps live here and never on the
//! parsed documents.

use super::outcome::{FailedDocument, SkippedDocument};
use super::progress::rate;
use crate::domain::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Summary of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique id of this run
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Documents discovered
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,

    /// Documents never dispatched because the run was interrupted or stopped early
    pub not_processed: usize,

    pub elapsed_seconds: f64,
    pub rate_per_second: f64,

    /// Failures sorted by source
    pub failures: Vec<FailedDocument>,

    /// Skipped duplicates with their fingerprints, sorted by source
    pub skipped_documents: Vec<SkippedDocument>,

    /// A shutdown signal stopped dispatching
    pub interrupted: bool,

    /// Strict mode stopped dispatching after a failure
    pub stopped_early: bool,
}

impl BatchReport {
    /// Build a report from collected outcomes
    ///
    /// Failure and skip lists are sorted by source for deterministic output.
    pub fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        total: usize,
        succeeded: usize,
        mut failures: Vec<FailedDocument>,
        mut skipped_documents: Vec<SkippedDocument>,
    ) -> Self {
        failures.sort_by(|a, b| a.source.cmp(&b.source));
        skipped_documents.sort_by(|a, b| a.source.cmp(&b.source));

        let finished_at = Utc::now();
        let elapsed_seconds = (finished_at - started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let processed = succeeded + failures.len() + skipped_documents.len();

        Self {
            run_id,
            started_at,
            finished_at,
            total,
            succeeded,
            failed: failures.len(),
            skipped: skipped_documents.len(),
            not_processed: total.saturating_sub(processed),
            elapsed_seconds,
            rate_per_second: rate(processed, elapsed_seconds),
            failures,
            skipped_documents,
            interrupted: false,
            stopped_early: false,
        }
    }

    pub fn with_interrupted(mut self, interrupted: bool) -> Self {
        self.interrupted = interrupted;
        self
    }

    pub fn with_stopped_early(mut self, stopped_early: bool) -> Self {
        self.stopped_early = stopped_early;
        self
    }

    /// Documents that reached a terminal state
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    /// No failures and every discovered document was handled
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && self.not_processed == 0
    }

    /// Get success rate as a percentage of attempted documents
    pub fn success_rate(&self) -> f64 {
        let attempted = self.succeeded + self.failed;
        if attempted == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / attempted as f64) * 100.0
    }

    /// Write the report as pretty JSON, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json).await?;
        tracing::info!(path = %path.display(), "Batch report written");
        Ok(())
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            total = self.total,
            succeeded = self.succeeded,
            failed = self.failed,
            skipped = self.skipped,
            not_processed = self.not_processed,
            elapsed_seconds = format!("{:.2}", self.elapsed_seconds),
            rate_per_second = format!("{:.2}", self.rate_per_second),
            success_rate = format!("{:.2}%", self.success_rate()),
            interrupted = self.interrupted,
            stopped_early = self.stopped_early,
            "Batch completed"
        );

        if !self.failures.is_empty() {
            tracing::warn!(
                failure_count = self.failures.len(),
                "Batch completed with failures"
            );
            for failure in &self.failures {
                tracing::warn!(
                    source = %failure.source,
                    kind = %failure.kind,
                    message = %failure.message,
                    "Document failed"
                );
            }
        }
    }
}
