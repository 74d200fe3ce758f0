//! Status command implementation
//!
//! This module implements the `status` command for displaying the fingerprints
//! recorded by previous batch runs.

use super::resolve_config;
use crate::adapters::create_fingerprint_store;
use crate::core::state::FingerprintTracker;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Number of most recent entries to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Only show entries whose source contains this text
    #[arg(long)]
    pub source: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking fingerprint status");

        println!("📊 Processing Status");
        println!();

        let config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        if !config.tracking.enabled {
            println!("Fingerprint tracking is disabled (tracking.enabled = false).");
            return Ok(0);
        }

        let tracker = FingerprintTracker::new_with_store(create_fingerprint_store(&config.tracking));
        if let Err(e) = tracker.load().await {
            println!("❌ Failed to load fingerprints from {}", tracker.describe());
            println!("   Error: {e}");
            return Ok(5);
        }

        let records: Vec<_> = tracker
            .records()
            .await
            .into_iter()
            .filter(|r| {
                self.source
                    .as_deref()
                    .map_or(true, |needle| r.source.as_str().contains(needle))
            })
            .collect();

        if records.is_empty() {
            println!("No processed documents recorded in {}.", tracker.describe());
            println!("Run 'spl-extract process' to parse a batch.");
            return Ok(0);
        }

        println!(
            "{} document(s) recorded in {}",
            records.len(),
            tracker.describe()
        );
        println!();
        println!(
            "{:<40} {:<14} {:<21} {:<38} {:<8}",
            "Source", "Fingerprint", "Recorded", "Document ID", "Version"
        );
        println!("{}", "-".repeat(124));

        for record in records.iter().take(self.limit) {
            println!(
                "{:<40} {:<14} {:<21} {:<38} {:<8}",
                record.source.as_str(),
                record.fingerprint.short(),
                record.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                record.document_id.as_deref().unwrap_or("-"),
                record
                    .version
                    .map_or_else(|| "-".to_string(), |v| v.to_string()),
            );
        }

        if records.len() > self.limit {
            println!("... and {} older entries", records.len() - self.limit);
        }

        println!();
        Ok(0)
    }
}
