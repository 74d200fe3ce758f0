//! Extraction diagnostics
//!
//! Diagnostics are accumulated while one document is extracted and validated. They are
//! attached to the result and never mutated after assembly completes.

use super::errors::SplError;
use serde::{Deserialize, Serialize};

/// Stable diagnostic codes
pub mod codes {
    pub const LOINC_CODE_UNKNOWN: &str = "LOINC_CODE_UNKNOWN";
    pub const CYCLIC_SECTION: &str = "CYCLIC_SECTION";
    pub const SECTION_EXPANSION_LIMIT: &str = "SECTION_EXPANSION_LIMIT";
    pub const SECTION_REFERENCE_UNRESOLVED: &str = "SECTION_REFERENCE_UNRESOLVED";
    pub const DUPLICATE_SECTION_ID: &str = "DUPLICATE_SECTION_ID";
    pub const MISSING_SECTION_ID: &str = "MISSING_SECTION_ID";
    pub const MISSING_REQUIRED_FIELD: &str = "MISSING_REQUIRED_FIELD";
    pub const MISSING_DOCUMENT_ID: &str = "MISSING_DOCUMENT_ID";
    pub const MISSING_SET_ID: &str = "MISSING_SET_ID";
    pub const INVALID_VERSION: &str = "INVALID_VERSION";
    pub const INVALID_UUID: &str = "INVALID_UUID";
    pub const MISSING_EFFECTIVE_TIME: &str = "MISSING_EFFECTIVE_TIME";
    pub const INVALID_DATE: &str = "INVALID_DATE";
    pub const UNKNOWN_CODE_SYSTEM: &str = "UNKNOWN_CODE_SYSTEM";
    pub const INVALID_NDC: &str = "INVALID_NDC";
    pub const INVALID_UNII: &str = "INVALID_UNII";
    pub const INVALID_QUANTITY: &str = "INVALID_QUANTITY";
    pub const UNIT_UNRECOGNIZED: &str = "UNIT_UNRECOGNIZED";
    pub const IMPLAUSIBLE_STRENGTH: &str = "IMPLAUSIBLE_STRENGTH";
    pub const ROUTE_FORM_MISMATCH: &str = "ROUTE_FORM_MISMATCH";
    pub const INGREDIENT_CLASS_UNKNOWN: &str = "INGREDIENT_CLASS_UNKNOWN";
    pub const SUBSTANCE_UNIDENTIFIED: &str = "SUBSTANCE_UNIDENTIFIED";
    pub const UNRESOLVED_SUBSTANCE: &str = "UNRESOLVED_SUBSTANCE";
    pub const UNRESOLVED_MOIETY: &str = "UNRESOLVED_MOIETY";
    pub const MISSING_PRODUCT_NAME: &str = "MISSING_PRODUCT_NAME";
    pub const CHARACTERISTIC_TYPE_UNKNOWN: &str = "CHARACTERISTIC_TYPE_UNKNOWN";
    pub const CHARACTERISTIC_VALUE_INVALID: &str = "CHARACTERISTIC_VALUE_INVALID";
    pub const MEDIA_REFERENCE_UNRESOLVED: &str = "MEDIA_REFERENCE_UNRESOLVED";
    pub const NO_SECTIONS: &str = "NO_SECTIONS";
}

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One extraction or validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub field_path: String,
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        field_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            field_path: field_path.into(),
            message: message.into(),
        }
    }

    pub fn error(
        code: impl Into<String>,
        field_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, code, field_path, message)
    }

    pub fn warning(
        code: impl Into<String>,
        field_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, code, field_path, message)
    }

    pub fn info(
        code: impl Into<String>,
        field_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Info, code, field_path, message)
    }

    /// Downgrades a non-fatal error into a diagnostic
    ///
    /// The field path is taken from the error when it carries one.
    pub fn from_error(severity: Severity, code: impl Into<String>, err: &SplError) -> Self {
        let field_path = match err {
            SplError::MissingRequiredField { field_path }
            | SplError::InvalidFormat { field_path, .. }
            | SplError::UnresolvedReference { field_path, .. }
            | SplError::CyclicStructure { field_path } => field_path.clone(),
            _ => String::new(),
        };
        Self::new(severity, code, field_path, err.to_string())
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} at {}: {}",
            self.severity, self.code, self.field_path, self.message
        )
    }
}

/// Ordered sequence of diagnostics for one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of diagnostics at the given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.0.iter().filter(|d| d.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    /// All diagnostics carrying the given code
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.0.iter().filter(move |d| d.code == code)
    }

    /// Diagnostics whose field path starts with the given prefix
    pub fn under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.0.iter().filter(move |d| d.field_path.starts_with(prefix))
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_severity_serialization() {
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
    }

    #[test]
    fn test_diagnostics_counts() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::info(codes::LOINC_CODE_UNKNOWN, "sections[0]", "x"));
        diagnostics.push(Diagnostic::warning(codes::UNIT_UNRECOGNIZED, "sections[1]", "y"));
        diagnostics.push(Diagnostic::error(codes::CYCLIC_SECTION, "sections[1].children[0]", "z"));

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.count(Severity::Error), 1);
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.with_code(codes::LOINC_CODE_UNKNOWN).count(), 1);
        assert_eq!(diagnostics.under("sections[1]").count(), 2);
    }

    #[test]
    fn test_from_error_keeps_field_path() {
        let err = SplError::CyclicStructure {
            field_path: "sections[2].children[0]".to_string(),
        };
        let diagnostic = Diagnostic::from_error(Severity::Error, codes::CYCLIC_SECTION, &err);
        assert_eq!(diagnostic.field_path, "sections[2].children[0]");
        assert!(diagnostic.message.contains("Cyclic structure"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::error(codes::INVALID_NDC, "sections[0].products[0].code", "bad");
        assert_eq!(
            diagnostic.to_string(),
            "[error] INVALID_NDC at sections[0].products[0].code: bad"
        );
    }
}
