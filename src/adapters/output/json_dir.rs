//! JSON directory sink
//!
//! Writes one file per document, named after the document id when it has one and after the
//! source file stem otherwise.

use super::traits::DocumentSink;
use crate::core::assemble::ParsedDocument;
use crate::domain::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Writes each parsed document as `<name>.json` into a directory
#[derive(Debug, Clone)]
pub struct JsonDirectorySink {
    directory: PathBuf,
    pretty: bool,
    include_diagnostics: bool,
}

impl JsonDirectorySink {
    /// Create a sink writing into `directory`
    ///
    /// # Arguments
    ///
    /// * `directory` - Output directory, created on first write
    /// * `pretty` - Pretty-print the JSON
    /// * `include_diagnostics` - Write `{document, diagnostics}` instead of the bare document
    pub fn new(directory: impl Into<PathBuf>, pretty: bool, include_diagnostics: bool) -> Self {
        Self {
            directory: directory.into(),
            pretty,
            include_diagnostics,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path the given document is written to
    pub fn path_for(&self, parsed: &ParsedDocument) -> PathBuf {
        let document = &parsed.document;
        let name = document
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| document.source.file_stem());
        self.directory.join(format!("{}.json", sanitize(name)))
    }
}

/// Keeps file names portable: anything outside `[A-Za-z0-9._-]` becomes `_`
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl DocumentSink for JsonDirectorySink {
    async fn write(&self, parsed: &ParsedDocument) -> Result<()> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let json = match (self.include_diagnostics, self.pretty) {
            (true, true) => serde_json::to_vec_pretty(parsed)?,
            (true, false) => serde_json::to_vec(parsed)?,
            (false, true) => serde_json::to_vec_pretty(&parsed.document)?,
            (false, false) => serde_json::to_vec(&parsed.document)?,
        };

        let path = self.path_for(parsed);
        tokio::fs::write(&path, json).await?;

        tracing::debug!(
            source = %parsed.document.source,
            path = %path.display(),
            "Wrote document"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.directory.display().to_string()
    }
}
