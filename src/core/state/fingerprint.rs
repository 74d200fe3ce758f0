//! Content fingerprints of source documents
//!
//! A fingerprint is the SHA-256 digest of the raw file bytes. It changes whenever the file
//! changes, which is all the batch layer needs to skip documents it has already processed.

use crate::domain::{Document, Fingerprint, SourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Calculate the SHA-256 fingerprint of raw bytes
///
/// # Examples
///
/// ```
/// use spl_extract::core::state::fingerprint::calculate_fingerprint;
///
/// let fp = calculate_fingerprint(b"<document/>");
/// assert_eq!(fp.as_str().len(), 64);
/// assert_eq!(fp, calculate_fingerprint(b"<document/>"));
/// ```
pub fn calculate_fingerprint(data: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();

    Fingerprint::from_hex_digest(format!("{result:x}"))
}

/// A fingerprint recorded after a document was processed successfully
///
/// Besides the digest, the record keeps the identifiers of the document that was produced so
/// the tracker can answer "which version of which label did this file contain".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub source: SourceId,
    pub fingerprint: Fingerprint,

    /// When the fingerprint was recorded
    pub recorded_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl FingerprintRecord {
    /// Creates a record stamped with the current time
    pub fn new(source: SourceId, fingerprint: Fingerprint) -> Self {
        Self {
            source,
            fingerprint,
            recorded_at: Utc::now(),
            document_id: None,
            set_id: None,
            version: None,
        }
    }

    /// Copies the identifiers of the document produced from the source
    pub fn with_document(mut self, document: &Document) -> Self {
        self.document_id = document.id.clone();
        self.set_id = document.set_id.clone();
        self.version = document.version;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let fp = calculate_fingerprint(b"hello");
        assert_eq!(
            fp.as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let a = calculate_fingerprint(b"<document><title>A</title></document>");
        let b = calculate_fingerprint(b"<document><title>B</title></document>");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_round_trips_through_validation() {
        let fp = calculate_fingerprint(b"data");
        assert_eq!(Fingerprint::new(fp.as_str()).unwrap(), fp);
    }

    #[test]
    fn test_record_serialization() {
        let record = FingerprintRecord::new(
            SourceId::new("labels/a.xml").unwrap(),
            calculate_fingerprint(b"a"),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "labels/a.xml");
        assert!(json.get("document_id").is_none());

        let back: FingerprintRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
