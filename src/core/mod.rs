//! Core pipeline for spl-extract.
//!
//! # Modules
//!
//! - [`extract`] - Quantity normalization, ingredient, product and clinical section extraction
//! - [`assemble`] - Section routing and document assembly
//! - [`validation`] - Structural, referential and format checks
//! - [`state`] - Content fingerprints and change tracking
//! - [`batch`] - Discovery, the worker pool and batch reporting
//!
//! # Pipeline
//!
//! 1. **Discover** input files and fingerprint their bytes
//! 2. **Skip** files whose fingerprint matches the last successful run
//! 3. **Parse** each remaining file on a worker: navigator, section router, extractors
//! 4. **Validate** the assembled document into diagnostics
//! 5. **Write** the document to the configured sink and record its fingerprint
//! 6. **Report** counts, failures and throughput
//!
//! # Example
//!
//! ```rust,no_run
//! use spl_extract::adapters::tracker::JsonFileFingerprintStore;
//! use spl_extract::core::batch::{BatchOrchestrator, BatchSettings};
//! use spl_extract::core::state::FingerprintTracker;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(JsonFileFingerprintStore::new(".spl-extract/fingerprints.json"));
//! let tracker = Arc::new(FingerprintTracker::new_with_store(store));
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let orchestrator = BatchOrchestrator::new(BatchSettings::new(8), tracker, shutdown_rx);
//! let report = orchestrator.run_directory(Path::new("labels"), "*.xml", true).await?;
//!
//! println!("Succeeded: {}", report.succeeded);
//! println!("Failed: {}", report.failed);
//! println!("Skipped: {}", report.skipped);
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod batch;
pub mod extract;
pub mod state;
pub mod validation;
