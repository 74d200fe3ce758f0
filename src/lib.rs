// spl-extract - Structured extraction for SPL drug label documents
// Copyright (c) 2025 spl-extract Contributors
// Licensed under the MIT License

//! # spl-extract
//!
//! spl-extract turns Structured Product Labeling (SPL) drug label documents, HL7 v3 XML
//! as published by regulators, into a typed document model with a list of diagnostics.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Navigating** namespace-qualified markup without caring about prefixes
//! - **Routing** sections to extractors by their LOINC code
//! - **Extracting** products, packaging, ingredients and strengths, and clinical text
//! - **Validating** the assembled document and reporting findings as diagnostics
//! - **Batch processing** directories of labels with bounded concurrency and fingerprint
//!   based duplicate detection
//!
//! ## Architecture
//!
//! - [`markup`] - Namespace-aware navigation over parsed markup
//! - [`domain`] - Document model, diagnostics, identifiers and errors
//! - [`core`] - Extraction, assembly, validation, fingerprint state and batch orchestration
//! - [`adapters`] - Fingerprint stores and document sinks
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//! - [`cli`] - Command-line interface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spl_extract::core::assemble::parse_document;
//! use spl_extract::domain::SourceId;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("label.xml")?;
//! let parsed = parse_document(&bytes, SourceId::new("label.xml")?)?;
//!
//! for (path, product) in parsed.document.products() {
//!     println!("{path}: {:?}", product.name);
//! }
//! for diagnostic in parsed.diagnostics.iter() {
//!     println!("{:?} {} at {}", diagnostic.severity, diagnostic.code, diagnostic.field_path);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! A document either fails as a whole with a [`domain::SplError`] (malformed markup, wrong
//! root element, timeout) or is assembled with [`domain::Diagnostics`] describing every
//! problem found along the way. Extraction never stops at the first bad field.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod markup;
