//! Manufactured products and their flat child records

use super::codes::CodedValue;
use super::forms::{DosageForm, Route};
use super::ingredient::{Ingredient, Measure, Quantity};
use serde::{Deserialize, Serialize};

/// A product listed in a product-data section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturedProduct {
    /// Product code (an NDC product code, typically)
    pub code: CodedValue,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage_form: Option<CodedValue>,

    /// Canonical form derived from the `formCode` display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_name: Option<DosageForm>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<CodedValue>,

    /// Canonical route derived from the `routeCode` display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_name: Option<Route>,

    #[serde(default)]
    pub generic_names: Vec<String>,

    #[serde(default)]
    pub ingredients: Vec<Ingredient>,

    #[serde(default)]
    pub packaging: Vec<PackagingConfiguration>,

    #[serde(default)]
    pub approvals: Vec<Approval>,

    #[serde(default)]
    pub marketing_acts: Vec<MarketingAct>,

    #[serde(default)]
    pub characteristics: Vec<Characteristic>,

    #[serde(default)]
    pub media: Vec<MediaReference>,
}

impl ManufacturedProduct {
    /// Display name with suffix, falling back to the first generic name
    pub fn display_name(&self) -> Option<String> {
        match (&self.name, &self.suffix) {
            (Some(name), Some(suffix)) => Some(format!("{name} {suffix}")),
            (Some(name), None) => Some(name.clone()),
            (None, _) => self.generic_names.first().cloned(),
        }
    }
}

/// One packaging level of a product
///
/// Nested containers are flattened in markup order; `level` is 0 for the container that
/// directly holds the product and grows outward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingConfiguration {
    pub level: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,

    /// Package code (an NDC package code, typically)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_code: Option<CodedValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<CodedValue>,
}

/// Regulatory approval (application number and marketing category)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodedValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory: Option<String>,
}

/// Marketing activity with status and effective period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketingAct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodedValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_low: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_high: Option<String>,
}

/// Physical characteristic (color, shape, size, imprint, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodedValue>,

    pub value: CharacteristicValue,
}

/// Characteristic value, tagged by its declared value type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CharacteristicValue {
    Coded {
        value: CodedValue,
    },
    Integer {
        value: i64,
    },
    Quantity {
        value: Measure,
    },
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        low: Option<Measure>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        high: Option<Measure>,
    },
    Text {
        value: String,
    },
    Boolean {
        value: bool,
    },
    /// Value of an unknown or unparsable type, kept as text
    Raw {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_type: Option<String>,
        text: String,
    },
}

/// Embedded media (images, typically) attached to a document, section or product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// File name or URI of the media object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
