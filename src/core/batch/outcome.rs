//! Per-document outcomes
//!
//! Every unit of work moves `Queued → InProgress → {Succeeded, Failed, SkippedDuplicate}`.

use crate::domain::{ErrorKind, Fingerprint, SourceId, SplError};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one input document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkState {
    Queued,
    InProgress,
    Succeeded,
    Failed,
    SkippedDuplicate,
}

impl WorkState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::SkippedDuplicate)
    }
}

/// A document that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDocument {
    pub source: SourceId,
    pub kind: ErrorKind,
    pub message: String,
}

impl FailedDocument {
    pub fn from_error(source: SourceId, error: &SplError) -> Self {
        Self {
            source,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn worker_panic(source: SourceId, message: impl Into<String>) -> Self {
        Self {
            source,
            kind: ErrorKind::WorkerPanic,
            message: message.into(),
        }
    }
}

/// A document skipped because its content was already processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub source: SourceId,
    pub fingerprint: Fingerprint,
}

/// Summary of a successfully processed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub source: SourceId,
    pub fingerprint: Fingerprint,
    pub document_id: Option<String>,
    pub errors: usize,
    pub warnings: usize,
}

/// Terminal result of one unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Succeeded(ProcessedDocument),
    Failed(FailedDocument),
    SkippedDuplicate(SkippedDocument),
}

impl DocumentOutcome {
    pub fn state(&self) -> WorkState {
        match self {
            Self::Succeeded(_) => WorkState::Succeeded,
            Self::Failed(_) => WorkState::Failed,
            Self::SkippedDuplicate(_) => WorkState::SkippedDuplicate,
        }
    }

    pub fn source(&self) -> &SourceId {
        match self {
            Self::Succeeded(d) => &d.source,
            Self::Failed(d) => &d.source,
            Self::SkippedDuplicate(d) => &d.source,
        }
    }
}
