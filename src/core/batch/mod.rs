//! Batch processing
//!
//! Discovery, the worker-pool orchestrator, per-document outcomes, running counters and the
//! final report.

pub mod discovery;
pub mod orchestrator;
pub mod outcome;
pub mod progress;
pub mod report;
pub mod settings;

pub use orchestrator::{BatchOrchestrator, DocumentParser};
pub use outcome::{DocumentOutcome, FailedDocument, ProcessedDocument, SkippedDocument, WorkState};
pub use progress::{ProgressCounters, ProgressSnapshot};
pub use report::BatchReport;
pub use settings::BatchSettings;
