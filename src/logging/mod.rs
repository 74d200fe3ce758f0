//! Logging and observability
//!
//! Structured logging through `tracing`, with a console layer and an optional rotating JSON
//! file layer. The macros below keep field names consistent across the crate.
//!
//! # Example
//!
//! ```no_run
//! use spl_extract::logging::init_logging;
//! use spl_extract::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(source = "labels/a.xml", "Parsing document");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a successfully parsed document
///
/// # Example
///
/// ```no_run
/// use spl_extract::log_document_parsed;
/// use spl_extract::core::assemble::parse_document;
/// use spl_extract::domain::SourceId;
///
/// let source = SourceId::new("label.xml").unwrap();
/// let parsed = parse_document(br#"<document xmlns="urn:hl7-org:v3"/>"#, source).unwrap();
/// log_document_parsed!(&parsed);
/// ```
#[macro_export]
macro_rules! log_document_parsed {
    ($parsed:expr) => {
        tracing::debug!(
            source = %$parsed.document.source,
            document_id = ?$parsed.document.id,
            sections = $parsed.document.sections.len(),
            diagnostics = $parsed.diagnostics.len(),
            has_errors = $parsed.diagnostics.has_errors(),
            "Document parsed"
        );
    };
}

/// Log a batch progress snapshot
///
/// # Example
///
/// ```no_run
/// use spl_extract::log_batch_progress;
/// use spl_extract::core::batch::ProgressCounters;
///
/// let counters = ProgressCounters::new(10);
/// log_batch_progress!(counters.snapshot());
/// ```
#[macro_export]
macro_rules! log_batch_progress {
    ($snapshot:expr) => {
        tracing::info!(
            total = $snapshot.total,
            processed = $snapshot.processed,
            succeeded = $snapshot.succeeded,
            failed = $snapshot.failed,
            skipped = $snapshot.skipped,
            in_flight = $snapshot.in_flight,
            rate_per_second = format!("{:.2}", $snapshot.rate_per_second),
            "Batch progress"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use spl_extract::log_error_with_context;
/// use spl_extract::domain::SplError;
///
/// let error = SplError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
