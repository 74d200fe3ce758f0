//! Batch settings
//!
//! The orchestrator treats these as read-only input for the whole run.

use crate::config::SplConfig;
use crate::core::validation::ValidationOptions;
use std::time::Duration;

/// Settings for one batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    /// Maximum number of documents parsed concurrently
    pub workers: usize,

    /// Skip sources whose fingerprint is unchanged since they were last recorded
    pub skip_duplicates: bool,

    /// Process everything even when fingerprints match
    pub force_reprocess: bool,

    /// Wall-clock limit for one document, none by default
    pub document_timeout: Option<Duration>,

    /// `false` stops dispatching after the first failed document
    pub continue_on_error: bool,

    /// How often a progress snapshot is logged
    pub progress_interval: Duration,

    pub validation: ValidationOptions,
}

impl BatchSettings {
    /// Default settings with the given worker count (clamped to at least 1)
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            skip_duplicates: true,
            force_reprocess: false,
            document_timeout: None,
            continue_on_error: true,
            progress_interval: Duration::from_secs(5),
            validation: ValidationOptions::default(),
        }
    }

    /// Create from the `[batch]` and `[validation]` configuration sections
    pub fn from_config(config: &SplConfig) -> Self {
        let batch = &config.batch;
        Self {
            workers: batch.workers.max(1),
            skip_duplicates: batch.skip_duplicates,
            force_reprocess: batch.force_reprocess,
            document_timeout: batch.document_timeout_secs.map(Duration::from_secs),
            continue_on_error: batch.continue_on_error,
            progress_interval: Duration::from_secs(batch.progress_interval_secs.max(1)),
            validation: ValidationOptions {
                strict_code_systems: config.validation.strict_code_systems,
            },
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_skip_duplicates(mut self, skip: bool) -> Self {
        self.skip_duplicates = skip;
        self
    }

    pub fn with_force_reprocess(mut self, force: bool) -> Self {
        self.force_reprocess = force;
        self
    }

    pub fn with_document_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.document_timeout = timeout;
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_validation(mut self, validation: ValidationOptions) -> Self {
        self.validation = validation;
        self
    }

    /// Whether unchanged fingerprints lead to `SkippedDuplicate`
    pub fn dedup_enabled(&self) -> bool {
        self.skip_duplicates && !self.force_reprocess
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::new(4)
    }
}
