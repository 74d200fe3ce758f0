//! Document sink abstraction

use crate::core::assemble::ParsedDocument;
use crate::domain::Result;
use async_trait::async_trait;

/// Downstream consumer of successfully assembled documents
///
/// The batch orchestrator hands every parsed document to a sink before recording its
/// fingerprint. A sink error therefore fails the document and it will be retried on the
/// next run.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Accept one parsed document
    ///
    /// # Errors
    ///
    /// Returns an error if the document could not be persisted.
    async fn write(&self, parsed: &ParsedDocument) -> Result<()>;

    /// Human readable description of the destination
    fn describe(&self) -> String;
}
