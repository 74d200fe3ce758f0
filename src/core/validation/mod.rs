//! Document validation
//!
//! Completeness, referential and format checks over an assembled document. Findings are
//! advisory: downstream consumers decide whether to accept a document with errors.

pub mod formats;
pub mod validator;

pub use validator::{ValidationOptions, Validator};
