//! Configuration schema types
//!
//! This module defines the configuration structure for spl-extract. Every section and every
//! key has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Main spl-extract configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Batch processing settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Fingerprint tracking
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Where parsed documents are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Validator options
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SplConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.batch.validate()?;
        self.tracking.validate()?;
        self.output.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory scanned for input documents (can be overridden on the command line)
    #[serde(default)]
    pub input_dir: Option<String>,

    /// File name pattern, `*.<ext>` or a literal file name
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Descend into subdirectories
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Number of documents parsed concurrently (1-256)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Skip files whose fingerprint matches the last successful run
    #[serde(default = "default_true")]
    pub skip_duplicates: bool,

    /// Reprocess every file regardless of recorded fingerprints
    #[serde(default)]
    pub force_reprocess: bool,

    /// Per-document wall-clock limit in seconds (unset = no limit)
    #[serde(default)]
    pub document_timeout_secs: Option<u64>,

    /// Keep going after a document fails (false = stop on first failure)
    #[serde(default = "default_true")]
    pub continue_on_error: bool,

    /// Seconds between progress snapshots
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,

    /// Write the batch report as JSON to this path
    #[serde(default)]
    pub report_path: Option<String>,
}

impl BatchConfig {
    fn validate(&self) -> Result<(), String> {
        if self.workers == 0 || self.workers > 256 {
            return Err(format!(
                "batch.workers must be between 1 and 256, got {}",
                self.workers
            ));
        }

        if self.pattern.trim().is_empty() {
            return Err("batch.pattern cannot be empty".to_string());
        }

        if self.document_timeout_secs == Some(0) {
            return Err("batch.document_timeout_secs must be > 0 when set".to_string());
        }

        if self.progress_interval_secs == 0 {
            return Err("batch.progress_interval_secs must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            pattern: default_pattern(),
            recursive: true,
            workers: default_workers(),
            skip_duplicates: true,
            force_reprocess: false,
            document_timeout_secs: None,
            continue_on_error: true,
            progress_interval_secs: default_progress_interval_secs(),
            report_path: None,
        }
    }
}

/// Fingerprint tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Persist fingerprints between runs
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON file holding recorded fingerprints
    #[serde(default = "default_fingerprint_store")]
    pub fingerprint_store: String,
}

impl TrackingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.fingerprint_store.trim().is_empty() {
            return Err(
                "tracking.fingerprint_store cannot be empty when tracking is enabled".to_string(),
            );
        }
        Ok(())
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fingerprint_store: default_fingerprint_store(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one JSON file per parsed document (unset = no output)
    #[serde(default)]
    pub directory: Option<String>,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,

    /// Write diagnostics next to the document
    #[serde(default = "default_true")]
    pub include_diagnostics: bool,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self
            .directory
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            return Err("output.directory cannot be empty when set".to_string());
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            pretty: false,
            include_diagnostics: true,
        }
    }
}

/// Validator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Report unknown code systems as warnings instead of info
    #[serde(default)]
    pub strict_code_systems: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when file logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_pattern() -> String {
    "*.xml".to_string()
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(256)
}

fn default_progress_interval_secs() -> u64 {
    5
}

fn default_fingerprint_store() -> String {
    ".spl-extract/fingerprints.json".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
        };

        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batch_config_validation() {
        let mut config = BatchConfig::default();
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 257;
        assert!(config.validate().is_err());

        config.workers = 4;
        config.document_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        config.document_timeout_secs = Some(30);
        config.progress_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tracking_config_validation() {
        let mut config = TrackingConfig::default();
        assert!(config.validate().is_ok());

        config.fingerprint_store = " ".to_string();
        assert!(config.validate().is_err());

        config.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.local_enabled);
        assert_eq!(config.local_path, "logs");
        assert_eq!(config.local_rotation, "daily");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let config = LoggingConfig {
            local_rotation: "size".to_string(),
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: SplConfig = toml::from_str("").unwrap();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.batch.pattern, "*.xml");
        assert!(config.batch.skip_duplicates);
        assert!(config.batch.continue_on_error);
        assert!(config.tracking.enabled);
        assert!(config.output.directory.is_none());
        assert!(!config.validation.strict_code_systems);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_progress_interval_secs(), 5);
        assert_eq!(default_fingerprint_store(), ".spl-extract/fingerprints.json");
        assert!((1..=256).contains(&default_workers()));
    }
}
