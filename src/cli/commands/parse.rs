//! Parse command implementation
//!
//! Parses a single label document and prints the result as JSON on stdout.

use super::resolve_config;
use crate::core::assemble::{DocumentAssembler, ParsedDocument};
use crate::core::validation::ValidationOptions;
use crate::domain::SourceId;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the parse command
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Label document to parse
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Print only the diagnostics
    #[arg(long)]
    pub diagnostics_only: bool,
}

impl ParseArgs {
    /// Execute the parse command
    ///
    /// Exit codes: 0 when the document has no error diagnostics, 1 when it does, 2 for
    /// configuration problems and 5 when no document could be built.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let source = match SourceId::from_path(&self.file) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let bytes = match tokio::fs::read(&self.file).await {
            Ok(b) => b,
            Err(e) => {
                eprintln!("❌ Failed to read {}: {e}", self.file.display());
                return Ok(5);
            }
        };

        let assembler = DocumentAssembler::new(ValidationOptions {
            strict_code_systems: config.validation.strict_code_systems,
        });

        let parsed = match assembler.assemble(&bytes, source) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!(file = %self.file.display(), kind = %e.kind(), error = %e, "Document failed");
                eprintln!("❌ {} [{}]: {e}", self.file.display(), e.kind());
                return Ok(5);
            }
        };

        crate::log_document_parsed!(parsed);
        println!("{}", self.render(&parsed)?);

        Ok(if parsed.diagnostics.has_errors() { 1 } else { 0 })
    }

    fn render(&self, parsed: &ParsedDocument) -> anyhow::Result<String> {
        let rendered = match (self.diagnostics_only, self.pretty) {
            (true, true) => serde_json::to_string_pretty(&parsed.diagnostics),
            (true, false) => serde_json::to_string(&parsed.diagnostics),
            (false, true) => serde_json::to_string_pretty(parsed),
            (false, false) => serde_json::to_string(parsed),
        };
        rendered.context("Failed to serialize parsed document")
    }
}
