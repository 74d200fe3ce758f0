//! Configuration management for spl-extract.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! spl-extract uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SPL_EXTRACT_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use spl_extract::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("spl-extract.toml")?;
//!
//! println!("Workers: {}", config.batch.workers);
//! println!("Fingerprints: {}", config.tracking.fingerprint_store);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`BatchConfig`] - Input discovery, worker pool, duplicate and failure policy
//! - [`TrackingConfig`] - Fingerprint store location
//! - [`OutputConfig`] - JSON output directory
//! - [`ValidationConfig`] - Validator options
//! - [`LoggingConfig`] - File logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [batch]
//! input_dir = "${SPL_LABEL_DIR}"
//! workers = 8
//! document_timeout_secs = 30
//!
//! [tracking]
//! fingerprint_store = ".spl-extract/fingerprints.json"
//!
//! [output]
//! directory = "parsed"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{default_config, load_config};
pub use schema::{
    ApplicationConfig, BatchConfig, LoggingConfig, OutputConfig, SplConfig, TrackingConfig,
    ValidationConfig,
};
