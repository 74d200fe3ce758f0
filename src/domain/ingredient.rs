//! Ingredients, substances and quantities

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Decimal number kept in its textual form
///
/// Quantities in labels are exact decimals ("0.125", "325"); keeping the text avoids
/// binary floating point drift in the extracted record. The text is validated on
/// construction and a leading `+` is dropped.
///
/// # Examples
///
/// ```
/// use spl_extract::domain::ingredient::DecimalValue;
///
/// let value = DecimalValue::parse(" 325 ").unwrap();
/// assert_eq!(value.as_str(), "325");
/// assert_eq!(value.as_f64(), 325.0);
/// assert!(DecimalValue::parse("NaN").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecimalValue(String);

impl DecimalValue {
    /// Parses a decimal literal (optional sign, digits, optional fraction and exponent)
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let body = unsigned.strip_prefix('-').unwrap_or(unsigned);

        let (mantissa, exponent) = match body.find(['e', 'E']) {
            Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
            None => (body, None),
        };
        let (whole, fraction) = match mantissa.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (mantissa, None),
        };

        let digits_ok = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        let has_digits = !whole.is_empty() || fraction.is_some_and(|f| !f.is_empty());
        let exponent_ok = exponent.map_or(true, |e| {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && digits_ok(e)
        });

        if !has_digits || !digits_ok(whole) || !fraction.map_or(true, digits_ok) || !exponent_ok {
            return Err(format!("'{raw}' is not a decimal number"));
        }

        match unsigned.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Self(unsigned.to_string())),
            _ => Err(format!("'{raw}' is out of range")),
        }
    }

    /// The decimal one
    pub fn one() -> Self {
        Self("1".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Approximate numeric value
    pub fn as_f64(&self) -> f64 {
        self.0.parse().unwrap_or_default()
    }

    pub fn is_negative(&self) -> bool {
        self.as_f64() < 0.0
    }

    pub fn is_zero(&self) -> bool {
        self.as_f64() == 0.0
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value with its (normalized) unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub value: DecimalValue,
    pub unit: String,
}

impl Measure {
    pub fn new(value: DecimalValue, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Numerator/denominator strength, e.g. 325 mg per 1 tablet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub numerator: Measure,
    pub denominator: Measure,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.numerator, self.denominator)
    }
}

/// Ingredient classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientClass {
    Active,
    Inactive,
}

impl IngredientClass {
    /// Maps an HL7 ingredient class marker to a classification
    ///
    /// `ACTIB` (basis of strength), `ACTIM` (moiety basis) and `ACTIR` (reference basis)
    /// are active; `IACT` is inactive. Anything else is unknown.
    pub fn from_class_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "ACTIB" | "ACTIM" | "ACTIR" | "ACTI" => Some(Self::Active),
            "IACT" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Identity of a substance within one document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum SubstanceKey {
    /// Identified by code and code system (a UNII, typically)
    Code { code: String, code_system: String },
    /// Identified by normalized name
    Name { name: String },
}

impl fmt::Display for SubstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code { code, code_system } => write!(f, "{code}@{code_system}"),
            Self::Name { name } => write!(f, "name:{name}"),
        }
    }
}

/// A substance referenced by ingredients and active moieties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substance {
    pub key: SubstanceKey,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_system: Option<String>,
}

impl Substance {
    /// Builds a substance from what the markup provides
    ///
    /// Returns `None` when there is neither a full code nor a usable name.
    pub fn identify(
        code: Option<&str>,
        code_system: Option<&str>,
        name: Option<&str>,
    ) -> Option<Self> {
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        let code_system = code_system.map(str::trim).filter(|c| !c.is_empty());
        let name = name
            .map(|n| n.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|n| !n.is_empty());

        let key = match (code, code_system) {
            (Some(code), Some(code_system)) => SubstanceKey::Code {
                code: code.to_ascii_uppercase(),
                code_system: code_system.to_string(),
            },
            _ => {
                let normalized = normalize_substance_name(name.as_deref()?);
                if normalized.is_empty() {
                    return None;
                }
                SubstanceKey::Name { name: normalized }
            }
        };

        Some(Self {
            key,
            name,
            code: code.map(str::to_string),
            code_system: code_system.map(str::to_string),
        })
    }
}

/// Normalizes a substance name for identity comparison
///
/// Collapses whitespace, uppercases and strips "(UNII: ...)", "[INN]" and "[USP]" markers.
pub fn normalize_substance_name(name: &str) -> String {
    let mut upper = name.to_uppercase();

    while let Some(start) = upper.find("(UNII:") {
        match upper[start..].find(')') {
            Some(end) => upper.replace_range(start..start + end + 1, " "),
            None => upper.truncate(start),
        }
    }
    for marker in ["[INN]", "[USP]"] {
        upper = upper.replace(marker, " ");
    }

    upper.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Document-scoped substance dedup table
///
/// Substances are appended in first-seen order and never replaced.
#[derive(Debug, Default)]
pub struct SubstanceTable {
    substances: Vec<Substance>,
    index: HashMap<SubstanceKey, usize>,
}

impl SubstanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key of an existing entry with the same identity, or inserts the candidate
    pub fn resolve(&mut self, candidate: Substance) -> SubstanceKey {
        if self.index.contains_key(&candidate.key) {
            return candidate.key;
        }
        let key = candidate.key.clone();
        self.index.insert(key.clone(), self.substances.len());
        self.substances.push(candidate);
        key
    }

    pub fn get(&self, key: &SubstanceKey) -> Option<&Substance> {
        self.index.get(key).map(|&i| &self.substances[i])
    }

    pub fn contains(&self, key: &SubstanceKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.substances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substances.is_empty()
    }

    /// Freezes the table into its ordered list
    pub fn into_vec(self) -> Vec<Substance> {
        self.substances
    }
}

/// An active or inactive ingredient of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub class: IngredientClass,

    /// Raw class marker as found in the markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_code: Option<String>,

    /// Reference into the document's substance list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substance: Option<SubstanceKey>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,

    /// Raw numerator text when a quantity was present but could not be parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_quantity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_moiety: Option<SubstanceKey>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("325", "325" ; "integer")]
    #[test_case("0.125", "0.125" ; "fraction")]
    #[test_case("+5", "5" ; "plus sign dropped")]
    #[test_case(".5", ".5" ; "leading dot")]
    #[test_case("1e3", "1e3" ; "exponent")]
    #[test_case("-2", "-2" ; "negative")]
    fn test_decimal_parse_valid(raw: &str, expected: &str) {
        assert_eq!(DecimalValue::parse(raw).unwrap().as_str(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("abc" ; "letters")]
    #[test_case("inf" ; "infinity")]
    #[test_case("NaN" ; "nan")]
    #[test_case("1.2.3" ; "two dots")]
    #[test_case("." ; "lone dot")]
    #[test_case("1e" ; "bare exponent")]
    #[test_case("3 mg" ; "trailing unit")]
    fn test_decimal_parse_invalid(raw: &str) {
        assert!(DecimalValue::parse(raw).is_err());
    }

    #[test]
    fn test_decimal_predicates() {
        assert!(DecimalValue::parse("-0.5").unwrap().is_negative());
        assert!(DecimalValue::parse("0.0").unwrap().is_zero());
        assert_eq!(DecimalValue::one().as_f64(), 1.0);
    }

    #[test]
    fn test_class_codes() {
        assert_eq!(
            IngredientClass::from_class_code("ACTIB"),
            Some(IngredientClass::Active)
        );
        assert_eq!(
            IngredientClass::from_class_code("actim"),
            Some(IngredientClass::Active)
        );
        assert_eq!(
            IngredientClass::from_class_code("IACT"),
            Some(IngredientClass::Inactive)
        );
        assert_eq!(IngredientClass::from_class_code("INGR"), None);
    }

    #[test]
    fn test_normalize_substance_name() {
        assert_eq!(
            normalize_substance_name("  Aspirin   (UNII: R16CO5Y76E) "),
            "ASPIRIN"
        );
        assert_eq!(
            normalize_substance_name("acetaminophen [USP]"),
            "ACETAMINOPHEN"
        );
        assert_eq!(normalize_substance_name("Ibuprofen [INN]"), "IBUPROFEN");
    }

    #[test]
    fn test_identify_prefers_code() {
        let substance =
            Substance::identify(Some("r16co5y76e"), Some(crate::domain::codes::UNII), Some("Aspirin"))
                .unwrap();
        assert_eq!(
            substance.key,
            SubstanceKey::Code {
                code: "R16CO5Y76E".to_string(),
                code_system: crate::domain::codes::UNII.to_string()
            }
        );
        assert_eq!(substance.name.as_deref(), Some("Aspirin"));
    }

    #[test]
    fn test_identify_falls_back_to_name() {
        let substance = Substance::identify(Some("ABC"), None, Some("starch,  corn")).unwrap();
        assert_eq!(
            substance.key,
            SubstanceKey::Name {
                name: "STARCH, CORN".to_string()
            }
        );
        assert!(Substance::identify(None, None, Some("   ")).is_none());
        assert!(Substance::identify(None, None, None).is_none());
    }

    #[test]
    fn test_substance_table_dedups() {
        let mut table = SubstanceTable::new();
        let a = table.resolve(Substance::identify(None, None, Some("Talc")).unwrap());
        let b = table.resolve(Substance::identify(None, None, Some("TALC [USP]")).unwrap());
        let c = table.resolve(Substance::identify(None, None, Some("Starch")).unwrap());

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.len(), 2);
        assert!(table.contains(&a));
        assert_eq!(table.get(&a).unwrap().name.as_deref(), Some("Talc"));

        let names: Vec<_> = table
            .into_vec()
            .into_iter()
            .filter_map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Talc", "Starch"]);
    }
}
