//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::SplConfig;
use crate::domain::errors::SplError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into SplConfig
/// 4. Applies environment variable overrides (SPL_EXTRACT_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use spl_extract::config::loader::load_config;
///
/// let config = load_config("spl-extract.toml").expect("Failed to load config");
/// println!("workers: {}", config.batch.workers);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SplConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SplError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SplError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: SplConfig = toml::from_str(&contents)
        .map_err(|e| SplError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config
        .validate()
        .map_err(|e| SplError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Configuration used when no file exists: defaults plus environment overrides
///
/// # Errors
///
/// Returns an error if an override produces an invalid configuration.
pub fn default_config() -> Result<SplConfig> {
    let mut config = SplConfig::default();
    apply_env_overrides(&mut config)?;
    config
        .validate()
        .map_err(|e| SplError::Configuration(format!("Configuration validation failed: {e}")))?;
    Ok(config)
}

fn placeholder_regex() -> Result<&'static Regex> {
    static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").ok())
        .as_ref()
        .ok_or_else(|| SplError::Other("placeholder pattern failed to compile".to_string()))
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = placeholder_regex()?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SplError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Parses an override value, reporting which variable was malformed
fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        SplError::Configuration(format!("Invalid value '{value}' for environment variable {name}"))
    })
}

/// Applies environment variable overrides using SPL_EXTRACT_* prefix
///
/// Environment variables follow the pattern: SPL_EXTRACT_<SECTION>_<KEY>
/// For example: SPL_EXTRACT_BATCH_WORKERS, SPL_EXTRACT_OUTPUT_DIRECTORY
fn apply_env_overrides(config: &mut SplConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env_var("SPL_EXTRACT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Batch overrides
    if let Some(val) = env_var("SPL_EXTRACT_BATCH_INPUT_DIR") {
        config.batch.input_dir = Some(val);
    }
    if let Some(val) = env_var("SPL_EXTRACT_BATCH_PATTERN") {
        config.batch.pattern = val;
    }
    if let Some(val) = env_var("SPL_EXTRACT_BATCH_RECURSIVE") {
        config.batch.recursive = parse_env("SPL_EXTRACT_BATCH_RECURSIVE", &val)?;
    }
    if let Some(val) = env_var("SPL_EXTRACT_BATCH_WORKERS") {
        config.batch.workers = parse_env("SPL_EXTRACT_BATCH_WORKERS", &val)?;
    }
    if let Some(val) = env_var("SPL_EXTRACT_BATCH_SKIP_DUPLICATES") {
        config.batch.skip_duplicates = parse_env("SPL_EXTRACT_BATCH_SKIP_DUPLICATES", &val)?;
    }
    if let Some(val) = env_var("SPL_EXTRACT_BATCH_FORCE_REPROCESS") {
        config.batch.force_reprocess = parse_env("SPL_EXTRACT_BATCH_FORCE_REPROCESS", &val)?;
    }
    if let Some(val) = env_var("SPL_EXTRACT_BATCH_DOCUMENT_TIMEOUT_SECS") {
        config.batch.document_timeout_secs =
            Some(parse_env("SPL_EXTRACT_BATCH_DOCUMENT_TIMEOUT_SECS", &val)?);
    }
    if let Some(val) = env_var("SPL_EXTRACT_BATCH_CONTINUE_ON_ERROR") {
        config.batch.continue_on_error = parse_env("SPL_EXTRACT_BATCH_CONTINUE_ON_ERROR", &val)?;
    }
    if let Some(val) = env_var("SPL_EXTRACT_BATCH_PROGRESS_INTERVAL_SECS") {
        config.batch.progress_interval_secs =
            parse_env("SPL_EXTRACT_BATCH_PROGRESS_INTERVAL_SECS", &val)?;
    }
    if let Some(val) = env_var("SPL_EXTRACT_BATCH_REPORT_PATH") {
        config.batch.report_path = Some(val);
    }

    // Tracking overrides
    if let Some(val) = env_var("SPL_EXTRACT_TRACKING_ENABLED") {
        config.tracking.enabled = parse_env("SPL_EXTRACT_TRACKING_ENABLED", &val)?;
    }
    if let Some(val) = env_var("SPL_EXTRACT_TRACKING_FINGERPRINT_STORE") {
        config.tracking.fingerprint_store = val;
    }

    // Output overrides
    if let Some(val) = env_var("SPL_EXTRACT_OUTPUT_DIRECTORY") {
        config.output.directory = Some(val);
    }
    if let Some(val) = env_var("SPL_EXTRACT_OUTPUT_PRETTY") {
        config.output.pretty = parse_env("SPL_EXTRACT_OUTPUT_PRETTY", &val)?;
    }
    if let Some(val) = env_var("SPL_EXTRACT_OUTPUT_INCLUDE_DIAGNOSTICS") {
        config.output.include_diagnostics =
            parse_env("SPL_EXTRACT_OUTPUT_INCLUDE_DIAGNOSTICS", &val)?;
    }

    // Validation overrides
    if let Some(val) = env_var("SPL_EXTRACT_VALIDATION_STRICT_CODE_SYSTEMS") {
        config.validation.strict_code_systems =
            parse_env("SPL_EXTRACT_VALIDATION_STRICT_CODE_SYSTEMS", &val)?;
    }

    // Logging overrides
    if let Some(val) = env_var("SPL_EXTRACT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("SPL_EXTRACT_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env_var("SPL_EXTRACT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env_var("SPL_EXTRACT_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
