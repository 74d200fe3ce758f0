//! Document, organization and section model
//!
//! The model is built bottom-up during extraction and is not mutated afterwards.

use super::codes::CodedValue;
use super::ids::SourceId;
use super::ingredient::Substance;
use super::product::{ManufacturedProduct, MediaReference};
use super::section_type::SectionType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A fully assembled label document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier (`id/@root`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Set identifier shared by all versions of the label (`setId/@root`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Effective time as written (`YYYYMMDD` with optional time part)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_time: Option<String>,

    /// Calendar date of the effective time when it parses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<CodedValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Labeler organization from the document author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Organization>,

    /// Registrants and establishments nested under the author
    #[serde(default)]
    pub organizations: Vec<Organization>,

    #[serde(default)]
    pub sections: Vec<Section>,

    /// Substances referenced by ingredients, deduplicated within this document
    #[serde(default)]
    pub substances: Vec<Substance>,

    /// Media objects not referenced from any section narrative
    #[serde(default)]
    pub media: Vec<MediaReference>,

    pub source: SourceId,
}

impl Document {
    /// Depth-first iterator over every section with its field path
    pub fn walk_sections(&self) -> Vec<(String, &Section)> {
        fn visit<'a>(prefix: &str, sections: &'a [Section], out: &mut Vec<(String, &'a Section)>) {
            for (i, section) in sections.iter().enumerate() {
                let path = if prefix.is_empty() {
                    format!("sections[{i}]")
                } else {
                    format!("{prefix}.children[{i}]")
                };
                out.push((path.clone(), section));
                visit(&path, &section.children, out);
            }
        }

        let mut out = Vec::new();
        visit("", &self.sections, &mut out);
        out
    }

    /// Every product in the document with its field path
    pub fn products(&self) -> Vec<(String, &ManufacturedProduct)> {
        self.walk_sections()
            .into_iter()
            .flat_map(|(path, section)| {
                section
                    .products
                    .iter()
                    .enumerate()
                    .map(move |(i, product)| (format!("{path}.products[{i}]"), product))
            })
            .collect()
    }
}

/// Role an organization plays for the labeled product
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationRole {
    Labeler,
    Registrant,
    Establishment,
    Manufacturer,
    Packer,
    Relabeler,
    Repacker,
    Distributor,
    Other(String),
}

impl OrganizationRole {
    /// Maps an establishment business-operation display name to a role
    pub fn from_operation(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "MANUFACTURE" | "API MANUFACTURE" => Self::Manufacturer,
            "PACK" => Self::Packer,
            "RELABEL" => Self::Relabeler,
            "REPACK" => Self::Repacker,
            "DISTRIBUTE" | "DISTRIBUTION" => Self::Distributor,
            "LABEL" => Self::Labeler,
            _ => Self::Other(name.trim().to_string()),
        }
    }
}

/// An organization named in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_root: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_extension: Option<String>,

    pub roles: Vec<OrganizationRole>,
}

impl Organization {
    /// Identity key: (root, extension) when present, else the normalized name
    pub fn identity_key(&self) -> Option<String> {
        match (&self.id_root, &self.id_extension) {
            (Some(root), Some(ext)) => Some(format!("{root}:{ext}")),
            _ => self
                .name
                .as_deref()
                .map(|n| n.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase())
                .filter(|n| !n.is_empty()),
        }
    }
}

/// Classification of a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionKind {
    Known { section_type: SectionType },
    /// Code absent or not in the table; title and text are preserved as found
    Unclassified {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_code: Option<String>,
    },
}

impl SectionKind {
    pub fn section_type(&self) -> Option<SectionType> {
        match self {
            Self::Known { section_type } => Some(*section_type),
            Self::Unclassified { .. } => None,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        matches!(self, Self::Unclassified { .. })
    }
}

/// A (possibly nested) document section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section identifier (`id/@root`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Markup-level `ID` attribute, the target of internal references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_id: Option<String>,

    /// LOINC section code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodedValue>,

    pub kind: SectionKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Position among siblings
    pub index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Products embedded in a product-data section
    #[serde(default)]
    pub products: Vec<ManufacturedProduct>,

    #[serde(default)]
    pub media: Vec<MediaReference>,

    #[serde(default)]
    pub children: Vec<Section>,
}

impl Section {
    /// The first embedded product, if any
    pub fn product(&self) -> Option<&ManufacturedProduct> {
        self.products.first()
    }
}
