//! Identifier types with validation
//!
//! Newtype wrappers for the identifiers the batch layer passes around. Document-level
//! identifiers read from markup stay plain strings on the model because they may be absent
//! or malformed, which the validator reports instead of rejecting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Stable identifier of an input document (a path or URI)
///
/// # Examples
///
/// ```
/// use spl_extract::domain::ids::SourceId;
/// use std::str::FromStr;
///
/// let source = SourceId::from_str("labels/aspirin.xml").unwrap();
/// assert_eq!(source.as_str(), "labels/aspirin.xml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Creates a new SourceId from a string
    ///
    /// Returns `Err` if the identifier is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Source ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Builds a SourceId from a filesystem path
    pub fn from_path(path: &Path) -> Result<Self, String> {
        Self::new(path.to_string_lossy().into_owned())
    }

    /// Returns the source ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path component without extension, used to name output files
    pub fn file_stem(&self) -> &str {
        Path::new(&self.0)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.0)
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for SourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Content fingerprint of a source document
///
/// Lowercase hex-encoded SHA-256 digest (64 characters).
///
/// # Examples
///
/// ```
/// use spl_extract::domain::ids::Fingerprint;
///
/// let fp = Fingerprint::new("a".repeat(64)).unwrap();
/// assert_eq!(fp.as_str().len(), 64);
/// assert!(Fingerprint::new("not-a-digest").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Creates a new Fingerprint, normalizing to lowercase
    ///
    /// Returns `Err` unless the input is exactly 64 hex digits.
    pub fn new(digest: impl Into<String>) -> Result<Self, String> {
        let digest = digest.into().trim().to_ascii_lowercase();
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!(
                "Invalid fingerprint: expected 64 hex characters, got '{digest}'"
            ));
        }
        Ok(Self(digest))
    }

    /// Wraps a digest already known to be lowercase hex, such as `{:x}` output of SHA-256
    pub(crate) fn from_hex_digest(digest: String) -> Self {
        debug_assert!(digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()));
        Self(digest)
    }

    /// Returns the fingerprint as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, enough to tell fingerprints apart in logs
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
