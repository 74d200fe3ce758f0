//! Record extractors
//!
//! Extractors are pure functions of a markup subtree plus the document-scoped
//! [`ExtractContext`]. They never fail the whole document: problems are recorded as
//! diagnostics, and only missing identity fields reject the enclosing record.

pub mod clinical;
pub mod ingredient;
pub mod media;
pub mod narrative;
pub mod product;
pub mod quantity;

pub use clinical::{extract_clinical, ClinicalContent};
pub use ingredient::extract_ingredient;
pub use media::MediaIndex;
pub use product::extract_product;
pub use quantity::{normalize_quantity, normalize_unit, QuantityOutcome, RawQuantity};

use crate::domain::{CodedValue, Diagnostics, SubstanceTable};
use crate::markup::navigator::{attr, text};
use roxmltree::Node;

/// Mutable state owned by the extraction of one document
///
/// The substance table is appended to as ingredients are read and frozen into the document
/// at the end. Nothing in here is shared between documents.
#[derive(Debug, Default)]
pub struct ExtractContext {
    pub substances: SubstanceTable,
    pub diagnostics: Diagnostics,
    pub media: MediaIndex,
}

impl ExtractContext {
    pub fn new(media: MediaIndex) -> Self {
        Self {
            substances: SubstanceTable::new(),
            diagnostics: Diagnostics::new(),
            media,
        }
    }
}

/// Reads a coded element (`code`, `formCode`, `routeCode`, ...)
///
/// Returns `None` when the element has no `code` attribute. The display name falls back to
/// the element's text, which some producers use instead of `displayName`.
pub fn coded_value(node: Node<'_, '_>) -> Option<CodedValue> {
    let mut value = CodedValue::new(attr(node, "code")?);
    if let Some(code_system) = attr(node, "codeSystem") {
        value = value.with_code_system(code_system);
    }
    if let Some(display_name) = attr(node, "displayName")
        .map(str::to_string)
        .or_else(|| text(node))
    {
        value = value.with_display_name(display_name);
    }
    Some(value)
}
