//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the spl-extract configuration file.

use crate::config::{load_config, SplConfig};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates after applying overrides
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        print_summary(&config);
        Ok(0)
    }
}

fn print_summary(config: &SplConfig) {
    let timeout = config
        .batch
        .document_timeout_secs
        .map_or_else(|| "none".to_string(), |s| format!("{s}s"));

    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!(
        "  Input Directory: {}",
        config.batch.input_dir.as_deref().unwrap_or("(not set)")
    );
    println!("  Pattern: {}", config.batch.pattern);
    println!("  Recursive: {}", config.batch.recursive);
    println!("  Workers: {}", config.batch.workers);
    println!("  Document Timeout: {timeout}");
    println!("  Continue On Error: {}", config.batch.continue_on_error);
    println!(
        "  Skip Duplicates: {} (force: {})",
        config.batch.skip_duplicates, config.batch.force_reprocess
    );
    if config.tracking.enabled {
        println!("  Fingerprint Store: {}", config.tracking.fingerprint_store);
    } else {
        println!("  Fingerprint Store: disabled");
    }
    println!(
        "  Output Directory: {}",
        config.output.directory.as_deref().unwrap_or("(none)")
    );
    println!(
        "  Strict Code Systems: {}",
        config.validation.strict_code_systems
    );
    if config.logging.local_enabled {
        println!(
            "  File Logging: {} ({})",
            config.logging.local_path, config.logging.local_rotation
        );
    }
    println!();
}
