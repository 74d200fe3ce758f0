//! External collaborators behind traits.
//!
//! - [`tracker`] - Fingerprint stores (JSON file, in-memory)
//! - [`output`] - Document sinks (JSON directory, in-memory)
//!
//! The batch orchestrator only sees the traits; the factories below pick implementations
//! from configuration.

pub mod output;
pub mod tracker;

use crate::config::{OutputConfig, TrackingConfig};
use output::{DocumentSink, JsonDirectorySink};
use std::sync::Arc;
use tracker::{FingerprintStore, JsonFileFingerprintStore, MemoryFingerprintStore};

/// Create the fingerprint store described by `[tracking]`
///
/// With tracking disabled fingerprints are still kept for the duration of the run, so a
/// file listed twice is only parsed once, but nothing is persisted.
pub fn create_fingerprint_store(config: &TrackingConfig) -> Arc<dyn FingerprintStore + Send + Sync> {
    if config.enabled {
        tracing::debug!(path = %config.fingerprint_store, "Using JSON fingerprint store");
        Arc::new(JsonFileFingerprintStore::new(&config.fingerprint_store))
    } else {
        tracing::debug!("Fingerprint tracking disabled, using in-memory store");
        Arc::new(MemoryFingerprintStore::new())
    }
}

/// Create the document sink described by `[output]`, if any
pub fn create_document_sink(config: &OutputConfig) -> Option<Arc<dyn DocumentSink + Send + Sync>> {
    config.directory.as_ref().map(|directory| {
        Arc::new(JsonDirectorySink::new(
            directory,
            config.pretty,
            config.include_diagnostics,
        )) as Arc<dyn DocumentSink + Send + Sync>
    })
}
