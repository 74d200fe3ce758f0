//! Domain error types
//!
//! This module defines the error hierarchy for spl-extract. Extraction errors follow the
//! document pipeline taxonomy; the remaining variants cover configuration, I/O and state.
//! All errors are domain-specific and don't expose third-party types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main spl-extract error type
///
/// Pipeline errors that are fatal for a document (malformed markup, timeout) surface as
/// this type. Non-fatal conditions are downgraded to diagnostics instead.
#[derive(Debug, Error)]
pub enum SplError {
    /// The input is not well-formed markup and no tree could be built
    #[error("Malformed markup at line {line}, column {column}: {message}")]
    MalformedMarkup {
        message: String,
        line: u32,
        column: u32,
    },

    /// A field required by the enclosing record is absent
    #[error("Missing required field: {field_path}")]
    MissingRequiredField { field_path: String },

    /// A field is present but does not match its expected format
    #[error("Invalid format at {field_path}: {message}")]
    InvalidFormat { field_path: String, message: String },

    /// A reference points at something that does not exist in the document
    #[error("Unresolved reference at {field_path}: {reference}")]
    UnresolvedReference {
        field_path: String,
        reference: String,
    },

    /// A structure references one of its own ancestors
    #[error("Cyclic structure at {field_path}")]
    CyclicStructure { field_path: String },

    /// Processing a document exceeded the configured wall-clock limit
    #[error("Document processing timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Fingerprint tracking errors
    #[error("State management error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Stable, serializable classification of an [`SplError`]
///
/// Batch reports carry this instead of the error itself so that operational tooling can
/// group failures without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MalformedMarkup,
    MissingRequiredField,
    InvalidFormat,
    UnresolvedReference,
    CyclicStructure,
    Timeout,
    Configuration,
    State,
    Serialization,
    Io,
    WorkerPanic,
    Other,
}

impl ErrorKind {
    /// Returns the wire name used in reports and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedMarkup => "MALFORMED_MARKUP",
            Self::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::UnresolvedReference => "UNRESOLVED_REFERENCE",
            Self::CyclicStructure => "CYCLIC_STRUCTURE",
            Self::Timeout => "TIMEOUT",
            Self::Configuration => "CONFIGURATION",
            Self::State => "STATE",
            Self::Serialization => "SERIALIZATION",
            Self::Io => "IO",
            Self::WorkerPanic => "WORKER_PANIC",
            Self::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SplError {
    /// Returns the classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedMarkup { .. } => ErrorKind::MalformedMarkup,
            Self::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            Self::CyclicStructure { .. } => ErrorKind::CyclicStructure,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::State(_) => ErrorKind::State,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Shorthand for [`SplError::MissingRequiredField`]
    pub fn missing(field_path: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field_path: field_path.into(),
        }
    }

    /// Shorthand for [`SplError::InvalidFormat`]
    pub fn invalid(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field_path: field_path.into(),
            message: message.into(),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for SplError {
    fn from(err: std::io::Error) -> Self {
        SplError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SplError {
    fn from(err: serde_json::Error) -> Self {
        SplError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SplError {
    fn from(err: toml::de::Error) -> Self {
        SplError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from XML parse errors, keeping the text position
impl From<roxmltree::Error> for SplError {
    fn from(err: roxmltree::Error) -> Self {
        let pos = err.pos();
        SplError::MalformedMarkup {
            message: err.to_string(),
            line: pos.row,
            column: pos.col,
        }
    }
}
