//! Domain models and types for spl-extract.
//!
//! This module contains the label document model produced by the extraction pipeline,
//! the diagnostics attached to it, identifier newtypes and the crate error type.
//!
//! # Overview
//!
//! - **Document model** ([`Document`], [`Section`], [`ManufacturedProduct`], [`Ingredient`])
//! - **Diagnostics** ([`Diagnostic`], [`Diagnostics`], [`Severity`])
//! - **Identifiers** ([`SourceId`], [`Fingerprint`])
//! - **Error types** ([`SplError`], [`ErrorKind`]) and the [`Result`] alias
//!
//! The model is serde-serializable and contains no wall-clock or random fields, so parsing
//! the same bytes twice yields identical values.
//!
//! ```rust
//! use spl_extract::domain::{SectionType, SubstanceTable, Substance};
//!
//! assert_eq!(SectionType::from_loinc("34071-1"), Some(SectionType::Warnings));
//!
//! let mut table = SubstanceTable::new();
//! let first = table.resolve(Substance::identify(None, None, Some("Talc")).unwrap());
//! let again = table.resolve(Substance::identify(None, None, Some("TALC")).unwrap());
//! assert_eq!(first, again);
//! ```

pub mod codes;
pub mod diagnostics;
pub mod document;
pub mod errors;
pub mod forms;
pub mod ids;
pub mod ingredient;
pub mod product;
pub mod result;
pub mod section_type;

// Re-export commonly used types for convenience
pub use codes::CodedValue;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use document::{Document, Organization, OrganizationRole, Section, SectionKind};
pub use errors::{ErrorKind, SplError};
pub use forms::{DosageForm, Route};
pub use ids::{Fingerprint, SourceId};
pub use ingredient::{
    DecimalValue, Ingredient, IngredientClass, Measure, Quantity, Substance, SubstanceKey,
    SubstanceTable,
};
pub use product::{
    Approval, Characteristic, CharacteristicValue, ManufacturedProduct, MarketingAct,
    MediaReference, PackagingConfiguration,
};
pub use result::Result;
pub use section_type::{SectionType, PRODUCT_LISTING_CODE};
