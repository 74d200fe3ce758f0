//! Process command implementation
//!
//! Runs the batch orchestrator over a directory (or an explicit file list) and prints the
//! batch report.

use super::resolve_config;
use crate::adapters::{create_document_sink, create_fingerprint_store};
use crate::config::SplConfig;
use crate::core::batch::{discovery, BatchOrchestrator, BatchReport, BatchSettings};
use crate::core::state::FingerprintTracker;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the process command
#[derive(Args, Debug, Default)]
pub struct ProcessArgs {
    /// Directory containing label documents (overrides batch.input_dir)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Explicit files to process instead of scanning a directory
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// File name pattern used when scanning (overrides batch.pattern)
    #[arg(long)]
    pub pattern: Option<String>,

    /// Number of concurrent workers (overrides batch.workers)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Reprocess files even if their fingerprint is unchanged
    #[arg(long)]
    pub force: bool,

    /// Stop dispatching after the first failed document
    #[arg(long)]
    pub strict: bool,

    /// Per-document timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Directory receiving one JSON file per document (overrides output.directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the batch report as JSON to this path (overrides batch.report_path)
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl ProcessArgs {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut SplConfig) {
        if let Some(input) = &self.input {
            config.batch.input_dir = Some(input.to_string_lossy().into_owned());
        }
        if let Some(pattern) = &self.pattern {
            config.batch.pattern = pattern.clone();
        }
        if let Some(workers) = self.workers {
            tracing::info!(workers, "Overriding worker count from CLI");
            config.batch.workers = workers;
        }
        if self.force {
            config.batch.force_reprocess = true;
        }
        if self.strict {
            config.batch.continue_on_error = false;
        }
        if let Some(timeout) = self.timeout_secs {
            config.batch.document_timeout_secs = Some(timeout);
        }
        if let Some(output) = &self.output {
            config.output.directory = Some(output.to_string_lossy().into_owned());
        }
        if let Some(report) = &self.report {
            config.batch.report_path = Some(report.to_string_lossy().into_owned());
        }
    }

    /// Execute the process command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let mut config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };
        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let paths = if !self.files.is_empty() {
            discovery::from_paths(self.files.iter().cloned())
        } else {
            let Some(input_dir) = config.batch.input_dir.as_deref() else {
                eprintln!("No input given: pass --input <DIR>, files, or set batch.input_dir");
                return Ok(2);
            };
            match discovery::discover(
                Path::new(input_dir),
                &config.batch.pattern,
                config.batch.recursive,
            ) {
                Ok(paths) => paths,
                Err(e) => {
                    tracing::error!(error = %e, "Input discovery failed");
                    eprintln!("❌ {e}");
                    return Ok(2);
                }
            }
        };

        let settings = BatchSettings::from_config(&config);
        let tracker = Arc::new(FingerprintTracker::new_with_store(create_fingerprint_store(
            &config.tracking,
        )));
        let mut orchestrator = BatchOrchestrator::new(settings, tracker, shutdown_signal);
        if let Some(sink) = create_document_sink(&config.output) {
            tracing::info!(output = %sink.describe(), "Writing parsed documents");
            orchestrator = orchestrator.with_sink(sink);
        }

        println!("🚀 Processing {} document(s)...", paths.len());

        let report = match orchestrator.run(paths).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Batch failed");
                eprintln!("Batch failed: {e}");
                return Ok(5);
            }
        };

        if let Some(report_path) = config.batch.report_path.as_deref() {
            if let Err(e) = report.write_json(Path::new(report_path)).await {
                tracing::warn!(error = %e, path = report_path, "Failed to write batch report");
                eprintln!("⚠️  Failed to write report to {report_path}: {e}");
            }
        }

        print_summary(&report);
        Ok(exit_code(&report))
    }
}

fn print_summary(report: &BatchReport) {
    println!();
    println!("📊 Batch Summary:");
    println!("  Run ID: {}", report.run_id);
    println!("  Total: {}", report.total);
    println!("  Succeeded: {}", report.succeeded);
    println!("  Failed: {}", report.failed);
    println!("  Skipped (unchanged): {}", report.skipped);
    if report.not_processed > 0 {
        println!("  Not processed: {}", report.not_processed);
    }
    println!("  Duration: {:.2}s", report.elapsed_seconds);
    println!("  Rate: {:.2} documents/s", report.rate_per_second);
    println!();

    if !report.failures.is_empty() {
        println!("⚠️  Failures:");
        for failure in report.failures.iter().take(10) {
            println!("  - {} [{}]: {}", failure.source, failure.kind, failure.message);
        }
        if report.failures.len() > 10 {
            println!("  ... and {} more failures", report.failures.len() - 10);
        }
        println!();
    }

    if report.interrupted {
        println!("⚠️  Processing interrupted. In-flight documents were completed.");
        println!("   Run the same command again to continue; finished files will be skipped.");
    } else if report.stopped_early {
        println!("⚠️  Stopped after the first failure (strict mode)");
    } else if report.is_successful() {
        println!("✅ Processing completed successfully!");
    } else {
        println!("⚠️  Processing completed with failures");
    }
}

/// 130 when interrupted, 1 when anything failed, 0 otherwise
pub fn exit_code(report: &BatchReport) -> i32 {
    if report.interrupted {
        130
    } else if report.failed > 0 || report.stopped_early {
        1
    } else {
        0
    }
}
