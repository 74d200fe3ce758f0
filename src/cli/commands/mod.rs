//! CLI command implementations

pub mod init;
pub mod parse;
pub mod process;
pub mod status;
pub mod validate;

use crate::config::{default_config, load_config, SplConfig};
use crate::domain::Result;
use std::path::Path;

/// Loads the configuration file when it exists, defaults otherwise
///
/// Commands other than `validate-config` run without a configuration file.
pub fn resolve_config(config_path: &str) -> Result<SplConfig> {
    if Path::new(config_path).exists() {
        load_config(config_path)
    } else {
        tracing::debug!(config_path, "Configuration file not found, using defaults");
        default_config()
    }
}
