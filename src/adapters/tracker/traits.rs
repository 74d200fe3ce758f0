//! Fingerprint store abstraction
//!
//! The orchestrator reads previously recorded fingerprints to decide which files are
//! unchanged, and reports new fingerprints back for the store to persist.

use crate::core::state::FingerprintRecord;
use crate::domain::Result;
use async_trait::async_trait;

/// Persistence backend for fingerprint records
///
/// Stores are append-only from the caller's point of view. When a source is recorded more
/// than once, the most recently appended record wins on the next [`load_all`](Self::load_all).
#[async_trait]
pub trait FingerprintStore: Send + Sync {
    /// Load every recorded fingerprint
    ///
    /// A store that has never been written to returns an empty vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage exists but cannot be read or decoded.
    async fn load_all(&self) -> Result<Vec<FingerprintRecord>>;

    /// Append newly recorded fingerprints
    ///
    /// # Arguments
    ///
    /// * `records` - Records produced by a successful processing pass
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be persisted.
    async fn append(&self, records: &[FingerprintRecord]) -> Result<()>;

    /// Human readable description of where records are kept, used in logs and `status`
    fn describe(&self) -> String;
}
