//! In-memory fingerprint store

use super::traits::FingerprintStore;
use crate::core::state::FingerprintRecord;
use crate::domain::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Fingerprint store that lives only as long as the process
///
/// Used by tests and by library callers that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryFingerprintStore {
    records: Mutex<Vec<FingerprintRecord>>,
}

impl MemoryFingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with records
    pub fn with_records(records: Vec<FingerprintRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

#[async_trait]
impl FingerprintStore for MemoryFingerprintStore {
    async fn load_all(&self) -> Result<Vec<FingerprintRecord>> {
        Ok(self.records.lock().await.clone())
    }

    async fn append(&self, records: &[FingerprintRecord]) -> Result<()> {
        self.records.lock().await.extend_from_slice(records);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
