//! Code-system identifiers (OIDs) that appear in SPL documents

use serde::{Deserialize, Serialize};

/// LOINC, used for section and document-type codes
pub const LOINC: &str = "2.16.840.1.113883.6.1";

/// National Drug Code directory (product and package codes)
pub const NDC: &str = "2.16.840.1.113883.6.69";

/// NCI Thesaurus (dosage forms, routes, marketing categories, characteristics)
pub const NCI_THESAURUS: &str = "2.16.840.1.113883.3.26.1.1";

/// FDA Unique Ingredient Identifier
pub const UNII: &str = "2.16.840.1.113883.4.9";

/// ISO 3166 country codes (approval territories)
pub const ISO_COUNTRY: &str = "2.16.840.1.113883.5.28";

/// FDA application numbers (NDA/ANDA/BLA)
pub const FDA_APPLICATION: &str = "2.16.840.1.113883.3.150";

/// HL7 ActStatus, used by marketing act status codes
pub const HL7_ACT_STATUS: &str = "2.16.840.1.113883.5.14";

/// Dun & Bradstreet numbers, used for organization identifiers
pub const DUNS: &str = "1.3.6.1.4.1.519.1";

/// FDA establishment and labeler registration identifiers
pub const FDA_ESTABLISHMENT: &str = "2.16.840.1.113883.4.82";

const KNOWN_CODE_SYSTEMS: &[(&str, &str)] = &[
    (LOINC, "LOINC"),
    (NDC, "NDC"),
    (NCI_THESAURUS, "NCI Thesaurus"),
    (UNII, "UNII"),
    (ISO_COUNTRY, "ISO 3166"),
    (FDA_APPLICATION, "FDA Application"),
    (HL7_ACT_STATUS, "HL7 ActStatus"),
    (DUNS, "DUNS"),
    (FDA_ESTABLISHMENT, "FDA Establishment"),
];

/// Returns the human-readable name of a known code system
pub fn code_system_name(oid: &str) -> Option<&'static str> {
    KNOWN_CODE_SYSTEMS
        .iter()
        .find(|(known, _)| *known == oid)
        .map(|(_, name)| *name)
}

/// A coded value as found on `code`, `formCode`, `routeCode` and similar elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedValue {
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl CodedValue {
    /// Creates a coded value without code system or display name
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            code_system: None,
            display_name: None,
        }
    }

    /// Sets the code system OID
    pub fn with_code_system(mut self, code_system: impl Into<String>) -> Self {
        self.code_system = Some(code_system.into());
        self
    }

    /// Sets the display name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Whether this code is drawn from the given code system
    pub fn is_in(&self, code_system: &str) -> bool {
        self.code_system.as_deref() == Some(code_system)
    }
}
