//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "spl-extract.toml")]
    pub output: String,

    /// Include every setting with comments instead of the minimal file
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(()) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set batch.input_dir in {}", self.output);
                println!("  2. Validate configuration: spl-extract validate-config");
                println!("  3. Run a batch: spl-extract process");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> &'static str {
        r#"# spl-extract configuration

[application]
log_level = "info"

[batch]
input_dir = "labels"
pattern = "*.xml"

[output]
directory = "parsed"
"#
    }

    /// Generate configuration with every setting documented
    fn generate_config_with_examples() -> &'static str {
        r#"# spl-extract configuration
#
# Values may reference environment variables as ${VAR_NAME}.
# Any key can be overridden with SPL_EXTRACT_<SECTION>_<KEY>,
# for example SPL_EXTRACT_BATCH_WORKERS=8.

[application]
# trace, debug, info, warn, error
log_level = "info"

[batch]
# Directory scanned for label documents
input_dir = "labels"
# "*.xml", "*" or a literal file name
pattern = "*.xml"
recursive = true
# Documents parsed concurrently (1-256)
workers = 4
# Skip files unchanged since their last successful parse
skip_duplicates = true
force_reprocess = false
# Per-document wall-clock limit; remove to disable
document_timeout_secs = 60
# false stops dispatching after the first failed document
continue_on_error = true
progress_interval_secs = 5
# report_path = "batch-report.json"

[tracking]
enabled = true
fingerprint_store = ".spl-extract/fingerprints.json"

[output]
# One JSON file per document; remove to parse without writing
directory = "parsed"
pretty = false
include_diagnostics = true

[validation]
# Unknown code systems become warnings instead of info
strict_code_systems = false

[logging]
local_enabled = false
local_path = "logs"
# daily or hourly
local_rotation = "daily"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config, SplConfig};
    use tempfile::TempDir;

    #[test]
    fn test_templates_parse_and_validate() {
        for template in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config: SplConfig = toml::from_str(template).unwrap();
            assert!(config.validate().is_ok());
            assert_eq!(config.batch.input_dir.as_deref(), Some("labels"));
        }
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spl-extract.toml");
        fs::write(&path, "# existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().into_owned(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "# existing");
    }

    #[tokio::test]
    async fn test_init_writes_loadable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spl-extract.toml");

        let args = InitArgs {
            output: path.to_string_lossy().into_owned(),
            with_examples: true,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 0);

        let config = load_config(&path).unwrap();
        assert_eq!(config.batch.document_timeout_secs, Some(60));
    }
}
