//! Result type alias for spl-extract
//!
//! This module provides a convenient Result type alias that uses SplError
//! as the error type.

use super::errors::SplError;

/// Result type alias for spl-extract operations
///
/// # Examples
///
/// ```
/// use spl_extract::domain::result::Result;
/// use spl_extract::domain::errors::SplError;
///
/// fn parse_version(raw: &str) -> Result<u32> {
///     raw.parse()
///         .map_err(|_| SplError::invalid("versionNumber", format!("not an integer: {raw}")))
/// }
///
/// assert!(parse_version("3").is_ok());
/// assert!(parse_version("three").is_err());
/// ```
pub type Result<T> = std::result::Result<T, SplError>;
