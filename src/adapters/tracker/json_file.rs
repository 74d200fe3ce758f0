//! JSON file fingerprint store
//!
//! Records are kept as a journal with one JSON object per line. Appending writes only the
//! new lines, so recording a document costs the same however many are already tracked. A
//! source recorded again gets a new line; the last line for a source wins.
//!
//! Loading compacts the journal when it holds superseded lines: the surviving records are
//! written to a temporary sibling which then replaces the file, so a reader never observes a
//! half-written journal. Files in the earlier single-document layout
//! (`{"version": 1, "records": [...]}`) are read and rewritten as a journal the same way.

use super::traits::FingerprintStore;
use crate::core::state::FingerprintRecord;
use crate::domain::{Result, SplError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const LEGACY_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct LegacyFile {
    version: u32,
    records: Vec<FingerprintRecord>,
}

/// Parsed journal contents
struct Journal {
    records: Vec<FingerprintRecord>,
    /// Lines read, including superseded and dropped ones
    lines: usize,
    legacy: bool,
}

impl Journal {
    fn needs_compaction(&self) -> bool {
        self.legacy || self.lines > self.records.len()
    }
}

/// Fingerprint store backed by one journal file on local disk
#[derive(Debug)]
pub struct JsonFileFingerprintStore {
    path: PathBuf,
    /// Serializes appends and compaction within this process
    write_lock: Mutex<()>,
}

impl JsonFileFingerprintStore {
    /// Creates a store for the given file path
    ///
    /// The file and its parent directories are created on the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, line: usize, e: impl std::fmt::Display) -> SplError {
        SplError::State(format!(
            "Fingerprint store {} is corrupt at line {line}: {e}",
            self.path.display()
        ))
    }

    async fn read_journal(&self) -> Result<Journal> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Journal {
                    records: Vec::new(),
                    lines: 0,
                    legacy: false,
                })
            }
            Err(e) => {
                return Err(SplError::State(format!(
                    "Failed to read fingerprint store {}: {e}",
                    self.path.display()
                )))
            }
        };

        if let Ok(legacy) = serde_json::from_str::<LegacyFile>(&content) {
            if legacy.version != LEGACY_FORMAT_VERSION {
                return Err(SplError::State(format!(
                    "Unsupported fingerprint store version {} in {}",
                    legacy.version,
                    self.path.display()
                )));
            }
            let lines = legacy.records.len();
            return Ok(Journal {
                records: latest_per_source(legacy.records),
                lines,
                legacy: true,
            });
        }

        let complete = content.ends_with('\n');
        let lines: Vec<(usize, &str)> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .collect();

        let mut parsed = Vec::with_capacity(lines.len());
        for (position, (number, line)) in lines.iter().enumerate() {
            match serde_json::from_str::<FingerprintRecord>(line) {
                Ok(record) => parsed.push(record),
                // An interrupted append leaves an unterminated last line
                Err(e) if !complete && position + 1 == lines.len() => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = number + 1,
                        error = %e,
                        "Dropping incomplete fingerprint record"
                    );
                }
                Err(e) => return Err(self.corrupt(number + 1, e)),
            }
        }

        Ok(Journal {
            lines: lines.len(),
            records: latest_per_source(parsed),
            legacy: false,
        })
    }

    async fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Replaces the journal with exactly `records`
    async fn rewrite(&self, records: &[FingerprintRecord]) -> Result<()> {
        self.ensure_parent().await?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, encode_lines(records)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// One entry per source; a later record replaces an earlier one in place
fn latest_per_source(records: Vec<FingerprintRecord>) -> Vec<FingerprintRecord> {
    let mut merged: Vec<FingerprintRecord> = Vec::with_capacity(records.len());
    let mut positions: HashMap<String, usize> = HashMap::new();
    for record in records {
        match positions.get(record.source.as_str()) {
            Some(&i) => merged[i] = record,
            None => {
                positions.insert(record.source.as_str().to_string(), merged.len());
                merged.push(record);
            }
        }
    }
    merged
}

fn encode_lines(records: &[FingerprintRecord]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, record)?;
        buf.push(b'\n');
    }
    Ok(buf)
}

#[async_trait]
impl FingerprintStore for JsonFileFingerprintStore {
    async fn load_all(&self) -> Result<Vec<FingerprintRecord>> {
        let _guard = self.write_lock.lock().await;
        let journal = self.read_journal().await?;

        if journal.needs_compaction() {
            tracing::debug!(
                path = %self.path.display(),
                lines = journal.lines,
                records = journal.records.len(),
                legacy = journal.legacy,
                "Compacting fingerprint store"
            );
            self.rewrite(&journal.records).await?;
        }

        Ok(journal.records)
    }

    async fn append(&self, records: &[FingerprintRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let lines = encode_lines(records)?;

        let _guard = self.write_lock.lock().await;
        self.ensure_parent().await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&lines).await?;
        file.sync_data().await?;

        tracing::debug!(
            path = %self.path.display(),
            appended = records.len(),
            "Appended to fingerprint store"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::calculate_fingerprint;
    use crate::domain::SourceId;
    use tempfile::TempDir;

    fn record(source: &str, content: &[u8]) -> FingerprintRecord {
        FingerprintRecord::new(SourceId::new(source).unwrap(), calculate_fingerprint(content))
    }

    fn line_count(path: &Path) -> usize {
        std::fs::read_to_string(path).unwrap().lines().count()
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileFingerprintStore::new(dir.path().join("fingerprints.json"));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("nested").join("fingerprints.json");
        let store = JsonFileFingerprintStore::new(&path);

        store.append(&[record("a.xml", b"a")]).await.unwrap();

        assert!(path.exists());
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_only_writes_new_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fp.json");
        let store = JsonFileFingerprintStore::new(&path);

        store.append(&[record("a.xml", b"a")]).await.unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        for i in 0..200 {
            store
                .append(&[record(&format!("doc-{i}.xml"), b"x")])
                .await
                .unwrap();
        }

        let after = std::fs::read_to_string(&path).unwrap();
        assert!(after.starts_with(&first));
        assert_eq!(after.lines().count(), 201);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_compacts_superseded_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fp.json");
        let store = JsonFileFingerprintStore::new(&path);

        store
            .append(&[record("a.xml", b"v1"), record("b.xml", b"b")])
            .await
            .unwrap();
        store.append(&[record("a.xml", b"v2")]).await.unwrap();
        assert_eq!(line_count(&path), 3);

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].source.as_str(), "a.xml");
        assert_eq!(loaded[0].fingerprint, calculate_fingerprint(b"v2"));
        assert_eq!(loaded[1].source.as_str(), "b.xml");
        assert_eq!(line_count(&path), 2);
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fp.json");

        JsonFileFingerprintStore::new(&path)
            .append(&[record("a.xml", b"a")])
            .await
            .unwrap();

        let reopened = JsonFileFingerprintStore::new(&path);
        assert_eq!(reopened.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_incomplete_last_line_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fp.json");
        let store = JsonFileFingerprintStore::new(&path);
        store.append(&[record("a.xml", b"a")]).await.unwrap();

        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str(r#"{"source":"b.xml","finger"#);
        std::fs::write(&path, content).unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(line_count(&path), 1);
    }

    #[tokio::test]
    async fn test_legacy_file_is_migrated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fp.json");
        let legacy = serde_json::json!({
            "version": 1,
            "records": [record("a.xml", b"a"), record("b.xml", b"b")],
        });
        std::fs::write(&path, serde_json::to_string_pretty(&legacy).unwrap()).unwrap();

        let store = JsonFileFingerprintStore::new(&path);
        assert_eq!(store.load_all().await.unwrap().len(), 2);
        assert_eq!(line_count(&path), 2);

        store.append(&[record("c.xml", b"c")]).await.unwrap();
        assert_eq!(store.load_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_corrupt_line_is_state_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fp.json");
        std::fs::write(&path, "{not json\n").unwrap();

        let err = JsonFileFingerprintStore::new(&path)
            .load_all()
            .await
            .unwrap_err();
        assert!(matches!(err, SplError::State(_)));
    }
}
