//! Quantity & unit normalization
//!
//! Parses numerator/denominator pairs and standardizes unit strings. Normalization degrades
//! gracefully: unknown units pass through with a warning and a bad denominator falls back to
//! one. Only an unusable numerator loses the quantity.

use crate::domain::diagnostics::codes;
use crate::domain::{DecimalValue, Diagnostic, Diagnostics, Measure, Quantity};
use crate::markup::navigator::{attr, child};
use crate::markup::QName;
use roxmltree::Node;

/// Unit used when a measure carries no unit attribute (HL7 default)
pub const DIMENSIONLESS: &str = "1";

/// Known unit spellings, lowercased, mapped to their canonical form
const UNIT_SYNONYMS: &[(&str, &str)] = &[
    ("mg", "mg"),
    ("milligram", "mg"),
    ("milligrams", "mg"),
    ("g", "g"),
    ("gm", "g"),
    ("gram", "g"),
    ("grams", "g"),
    ("kg", "kg"),
    ("kilogram", "kg"),
    ("kilograms", "kg"),
    ("mcg", "mcg"),
    ("ug", "mcg"),
    ("µg", "mcg"),
    ("μg", "mcg"),
    ("microgram", "mcg"),
    ("micrograms", "mcg"),
    ("ng", "ng"),
    ("nanogram", "ng"),
    ("nanograms", "ng"),
    ("ml", "mL"),
    ("milliliter", "mL"),
    ("milliliters", "mL"),
    ("millilitre", "mL"),
    ("millilitres", "mL"),
    ("l", "L"),
    ("liter", "L"),
    ("liters", "L"),
    ("litre", "L"),
    ("dl", "dL"),
    ("unit", "units"),
    ("units", "units"),
    ("[u]", "units"),
    ("iu", "IU"),
    ("[iu]", "IU"),
    ("international unit", "IU"),
    ("international units", "IU"),
    ("%", "%"),
    ("percent", "%"),
    ("meq", "mEq"),
    ("[meq]", "mEq"),
    ("mmol", "mmol"),
    ("mol", "mol"),
    ("1", "1"),
    ("{tablet}", "{tablet}"),
    ("tablet", "{tablet}"),
    ("tablets", "{tablet}"),
    ("{capsule}", "{capsule}"),
    ("capsule", "{capsule}"),
    ("capsules", "{capsule}"),
    ("{spray}", "{spray}"),
    ("spray", "{spray}"),
    ("{actuat}", "{actuat}"),
    ("{patch}", "{patch}"),
    ("{lozenge}", "{lozenge}"),
    ("{suppository}", "{suppository}"),
];

/// Result of a unit lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitLookup {
    /// Recognized unit in canonical spelling
    Known(&'static str),
    /// Unrecognized unit, trimmed but otherwise untouched
    Unknown(String),
}

impl UnitLookup {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(unit) => unit,
            Self::Unknown(unit) => unit,
        }
    }
}

/// Looks a unit string up in the synonym table
///
/// # Examples
///
/// ```
/// use spl_extract::core::extract::quantity::{normalize_unit, UnitLookup};
///
/// assert_eq!(normalize_unit("Milligrams"), UnitLookup::Known("mg"));
/// assert_eq!(normalize_unit("[hp_X]"), UnitLookup::Unknown("[hp_X]".to_string()));
/// ```
pub fn normalize_unit(raw: &str) -> UnitLookup {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    UNIT_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == lowered)
        .map(|(_, canonical)| UnitLookup::Known(canonical))
        .unwrap_or_else(|| UnitLookup::Unknown(trimmed.to_string()))
}

/// Raw numerator/denominator attributes of a quantity element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawQuantity<'a> {
    pub numerator_value: Option<&'a str>,
    pub numerator_unit: Option<&'a str>,
    pub denominator_value: Option<&'a str>,
    pub denominator_unit: Option<&'a str>,
}

impl<'a> RawQuantity<'a> {
    /// Reads `numerator` and `denominator` children of a `quantity` element
    pub fn from_node(quantity: Node<'a, '_>) -> Self {
        let numerator = child(quantity, QName::hl7("numerator"));
        let denominator = child(quantity, QName::hl7("denominator"));
        Self {
            numerator_value: numerator.and_then(|n| attr(n, "value")),
            numerator_unit: numerator.and_then(|n| attr(n, "unit")),
            denominator_value: denominator.and_then(|d| attr(d, "value")),
            denominator_unit: denominator.and_then(|d| attr(d, "unit")),
        }
    }
}

/// Outcome of normalizing a quantity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityOutcome {
    Parsed(Quantity),
    /// The numerator was present but unusable; carries its raw text
    Invalid(String),
}

/// Normalizes a raw quantity pair
///
/// The denominator value defaults to 1 and its unit to the numerator's unit when omitted.
/// Warnings and errors are appended to `diagnostics` under `field_path`.
pub fn normalize_quantity(
    raw: RawQuantity<'_>,
    field_path: &str,
    diagnostics: &mut Diagnostics,
) -> QuantityOutcome {
    let numerator_path = format!("{field_path}.numerator");

    let numerator_text = raw.numerator_value.unwrap_or_default();
    let numerator_value = match DecimalValue::parse(numerator_text) {
        Ok(value) if value.is_negative() => {
            diagnostics.push(Diagnostic::error(
                codes::INVALID_QUANTITY,
                &numerator_path,
                format!("numerator value '{numerator_text}' is negative"),
            ));
            return QuantityOutcome::Invalid(numerator_text.to_string());
        }
        Ok(value) => value,
        Err(reason) => {
            let message = if raw.numerator_value.is_none() {
                "numerator value is missing".to_string()
            } else {
                format!("numerator {reason}")
            };
            diagnostics.push(Diagnostic::error(
                codes::INVALID_QUANTITY,
                &numerator_path,
                message,
            ));
            return QuantityOutcome::Invalid(numerator_text.to_string());
        }
    };

    let numerator_unit = normalize_unit_or_warn(
        raw.numerator_unit.unwrap_or(DIMENSIONLESS),
        &numerator_path,
        diagnostics,
    );

    let denominator_path = format!("{field_path}.denominator");
    let denominator_value = match raw.denominator_value {
        None => DecimalValue::one(),
        Some(text) => DecimalValue::parse(text).unwrap_or_else(|reason| {
            diagnostics.push(Diagnostic::warning(
                codes::INVALID_QUANTITY,
                &denominator_path,
                format!("denominator {reason}; defaulting to 1"),
            ));
            DecimalValue::one()
        }),
    };
    let denominator_unit = match raw.denominator_unit {
        Some(unit) => normalize_unit_or_warn(unit, &denominator_path, diagnostics),
        None => numerator_unit.clone(),
    };

    QuantityOutcome::Parsed(Quantity {
        numerator: Measure::new(numerator_value, numerator_unit),
        denominator: Measure::new(denominator_value, denominator_unit),
    })
}

/// Parses a single physical quantity (`value` + `unit` attributes)
///
/// Returns `None` when the value is absent or not a decimal.
pub fn parse_measure(
    node: Node<'_, '_>,
    field_path: &str,
    diagnostics: &mut Diagnostics,
) -> Option<Measure> {
    let value = DecimalValue::parse(attr(node, "value")?).ok()?;
    let unit = normalize_unit_or_warn(
        attr(node, "unit").unwrap_or(DIMENSIONLESS),
        field_path,
        diagnostics,
    );
    Some(Measure::new(value, unit))
}

fn normalize_unit_or_warn(raw: &str, field_path: &str, diagnostics: &mut Diagnostics) -> String {
    match normalize_unit(raw) {
        UnitLookup::Known(unit) => unit.to_string(),
        UnitLookup::Unknown(unit) => {
            diagnostics.push(Diagnostic::warning(
                codes::UNIT_UNRECOGNIZED,
                format!("{field_path}.unit"),
                format!("unit '{unit}' is not in the synonym table and was kept as is"),
            ));
            unit
        }
    }
}
