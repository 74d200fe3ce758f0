//! In-memory document sink

use super::traits::DocumentSink;
use crate::core::assemble::ParsedDocument;
use crate::domain::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Collects parsed documents in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    documents: Mutex<Vec<ParsedDocument>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far, in completion order
    pub async fn documents(&self) -> Vec<ParsedDocument> {
        self.documents.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn write(&self, parsed: &ParsedDocument) -> Result<()> {
        self.documents.lock().await.push(parsed.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
