//! Fingerprint tracker
//!
//! Keeps the fingerprint table for one batch run. The table is loaded from a
//! [`FingerprintStore`] once, consulted for every discovered file, and extended only after a
//! document was processed successfully.

use crate::adapters::tracker::FingerprintStore;
use crate::core::state::fingerprint::FingerprintRecord;
use crate::domain::{Fingerprint, Result, SourceId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tracker over an injected fingerprint store
pub struct FingerprintTracker {
    /// Fingerprint storage backend
    store: Arc<dyn FingerprintStore + Send + Sync>,

    known: RwLock<HashMap<SourceId, FingerprintRecord>>,
}

impl FingerprintTracker {
    /// Create a new tracker with a fingerprint storage backend
    ///
    /// # Arguments
    ///
    /// * `store` - Fingerprint store implementation
    pub fn new_with_store(store: Arc<dyn FingerprintStore + Send + Sync>) -> Self {
        Self {
            store,
            known: RwLock::new(HashMap::new()),
        }
    }

    /// Load previously recorded fingerprints into memory
    ///
    /// Replaces anything loaded before. Returns the number of tracked sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn load(&self) -> Result<usize> {
        let records = self.store.load_all().await?;
        let mut known = self.known.write().await;
        known.clear();
        for record in records {
            known.insert(record.source.clone(), record);
        }

        tracing::debug!(
            store = %self.store.describe(),
            tracked = known.len(),
            "Loaded fingerprint table"
        );
        Ok(known.len())
    }

    /// Whether `source` was previously recorded with exactly this fingerprint
    pub async fn is_unchanged(&self, source: &SourceId, fingerprint: &Fingerprint) -> bool {
        self.known
            .read()
            .await
            .get(source)
            .is_some_and(|record| &record.fingerprint == fingerprint)
    }

    /// Record a successfully processed source
    ///
    /// The record is persisted through the store before the in-memory table is updated, so a
    /// failed write leaves the table as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the record.
    pub async fn record(&self, record: FingerprintRecord) -> Result<()> {
        self.store.append(std::slice::from_ref(&record)).await?;
        self.known
            .write()
            .await
            .insert(record.source.clone(), record);
        Ok(())
    }

    /// All tracked records, most recently recorded first
    pub async fn records(&self) -> Vec<FingerprintRecord> {
        let mut records: Vec<_> = self.known.read().await.values().cloned().collect();
        records.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then_with(|| a.source.cmp(&b.source))
        });
        records
    }

    pub async fn len(&self) -> usize {
        self.known.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.known.read().await.is_empty()
    }

    /// Description of the underlying store
    pub fn describe(&self) -> String {
        self.store.describe()
    }
}
