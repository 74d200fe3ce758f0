//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX` so they do not interfere
//! with each other.

use spl_extract::config::{default_config, load_config};
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const OVERRIDES: &[&str] = &[
    "SPL_EXTRACT_APPLICATION_LOG_LEVEL",
    "SPL_EXTRACT_BATCH_WORKERS",
    "SPL_EXTRACT_BATCH_DOCUMENT_TIMEOUT_SECS",
    "SPL_EXTRACT_BATCH_CONTINUE_ON_ERROR",
    "SPL_EXTRACT_TRACKING_ENABLED",
    "SPL_EXTRACT_OUTPUT_DIRECTORY",
    "SPL_TEST_LABEL_DIR",
];

fn cleanup_env_vars() {
    for name in OVERRIDES {
        std::env::remove_var(name);
    }
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = config_file(
        r#"
[application]
log_level = "debug"

[batch]
input_dir = "labels"
pattern = "*.xml"
recursive = false
workers = 6
skip_duplicates = true
force_reprocess = false
document_timeout_secs = 45
continue_on_error = false
progress_interval_secs = 2
report_path = "report.json"

[tracking]
enabled = true
fingerprint_store = "state/fingerprints.json"

[output]
directory = "parsed"
pretty = true
include_diagnostics = false

[validation]
strict_code_systems = true

[logging]
local_enabled = true
local_path = "var/log"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.batch.input_dir.as_deref(), Some("labels"));
    assert!(!config.batch.recursive);
    assert_eq!(config.batch.workers, 6);
    assert_eq!(config.batch.document_timeout_secs, Some(45));
    assert!(!config.batch.continue_on_error);
    assert_eq!(config.batch.report_path.as_deref(), Some("report.json"));
    assert_eq!(config.tracking.fingerprint_store, "state/fingerprints.json");
    assert!(config.output.pretty);
    assert!(!config.output.include_diagnostics);
    assert!(config.validation.strict_code_systems);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_env_var_substitution() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SPL_TEST_LABEL_DIR", "/data/labels");

    let file = config_file("[batch]\ninput_dir = \"${SPL_TEST_LABEL_DIR}\"\n");
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.batch.input_dir.as_deref(), Some("/data/labels"));

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable_fails() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = config_file("[batch]\ninput_dir = \"${SPL_TEST_LABEL_DIR}\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("SPL_TEST_LABEL_DIR"));
}

#[test]
fn test_env_overrides_take_precedence() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SPL_EXTRACT_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("SPL_EXTRACT_BATCH_WORKERS", "12");
    std::env::set_var("SPL_EXTRACT_BATCH_DOCUMENT_TIMEOUT_SECS", "15");
    std::env::set_var("SPL_EXTRACT_BATCH_CONTINUE_ON_ERROR", "false");
    std::env::set_var("SPL_EXTRACT_OUTPUT_DIRECTORY", "elsewhere");

    let file = config_file("[batch]\nworkers = 2\n\n[output]\ndirectory = \"parsed\"\n");
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.batch.workers, 12);
    assert_eq!(config.batch.document_timeout_secs, Some(15));
    assert!(!config.batch.continue_on_error);
    assert_eq!(config.output.directory.as_deref(), Some("elsewhere"));

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_is_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SPL_EXTRACT_TRACKING_ENABLED", "sometimes");

    let err = default_config().unwrap_err();
    assert!(err.to_string().contains("SPL_EXTRACT_TRACKING_ENABLED"));

    cleanup_env_vars();
}

#[test]
fn test_override_failing_validation() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SPL_EXTRACT_BATCH_WORKERS", "0");

    let err = default_config().unwrap_err();
    assert!(err.to_string().contains("batch.workers"));

    cleanup_env_vars();
}

#[test]
fn test_defaults_without_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let config = default_config().unwrap();
    assert_eq!(config.batch.pattern, "*.xml");
    assert!(config.batch.continue_on_error);
    assert!(config.tracking.enabled);
    assert!(config.output.directory.is_none());
}

#[test]
fn test_invalid_toml_fails() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = config_file("[batch\nworkers = 2\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}
