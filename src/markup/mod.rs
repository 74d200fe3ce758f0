//! Markup access layer
//!
//! Parsing and namespace-aware lookups over SPL documents. See [`navigator`].

pub mod navigator;

pub use navigator::{decode, Navigator, QName, HL7_NS, XSI_NS};
