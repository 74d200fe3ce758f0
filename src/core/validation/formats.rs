//! Format checks for identifiers found in label documents

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

const NDC_PRODUCT_PATTERN: &str = r"^(\d{4}-\d{4}|\d{5}-\d{3}|\d{5}-\d{4})$";
const NDC_PACKAGE_PATTERN: &str =
    r"^(\d{4}-\d{4}-\d{2}|\d{5}-\d{3}-\d{2}|\d{5}-\d{4}-\d{1,2})$";
const UNII_PATTERN: &str = r"^[A-Z0-9]{10}$";

static NDC_PRODUCT: OnceLock<Option<Regex>> = OnceLock::new();
static NDC_PACKAGE: OnceLock<Option<Regex>> = OnceLock::new();
static UNII: OnceLock<Option<Regex>> = OnceLock::new();

fn matches(cell: &'static OnceLock<Option<Regex>>, pattern: &str, value: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Labeler-product NDC: 4-4, 5-3 or 5-4 digits
pub fn is_ndc_product_code(code: &str) -> bool {
    matches(&NDC_PRODUCT, NDC_PRODUCT_PATTERN, code.trim())
}

/// Labeler-product-package NDC: 4-4-2, 5-3-2, 5-4-1, or the 11 digit 5-4-2 form
pub fn is_ndc_package_code(code: &str) -> bool {
    matches(&NDC_PACKAGE, NDC_PACKAGE_PATTERN, code.trim())
}

/// Ten uppercase alphanumeric characters
pub fn is_unii(code: &str) -> bool {
    matches(&UNII, UNII_PATTERN, code.trim())
}

/// Hyphenated UUID as used by document and set identifiers
pub fn is_uuid(value: &str) -> bool {
    let value = value.trim();
    value.len() == 36 && uuid::Uuid::try_parse(value).is_ok()
}

/// Calendar date of an HL7 timestamp (`YYYYMMDD` followed by an optional time part)
pub fn effective_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date = value.get(..8)?;
    if value[8..].chars().next().is_some_and(|c| c.is_ascii_digit()) && value.len() < 10 {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("0363-0160", true ; "4-4")]
    #[test_case("12345-678", true ; "5-3")]
    #[test_case("12345-6789", true ; "5-4")]
    #[test_case("123-4567", false ; "3-4")]
    #[test_case("0363-0160-01", false ; "package code")]
    #[test_case("03630160", false ; "no hyphen")]
    #[test_case("abcd-efgh", false ; "letters")]
    fn test_ndc_product(code: &str, expected: bool) {
        assert_eq!(is_ndc_product_code(code), expected);
    }

    #[test_case("0363-0160-01", true ; "4-4-2")]
    #[test_case("12345-678-90", true ; "5-3-2")]
    #[test_case("12345-6789-0", true ; "5-4-1")]
    #[test_case("12345-6789-01", true ; "5-4-2")]
    #[test_case("0363-0160", false ; "product code")]
    #[test_case("1234-5678-901", false ; "4-4-3")]
    fn test_ndc_package(code: &str, expected: bool) {
        assert_eq!(is_ndc_package_code(code), expected);
    }

    #[test_case("R16CO5Y76E", true)]
    #[test_case("362O9ITL9D", true)]
    #[test_case("r16co5y76e", false)]
    #[test_case("R16CO5Y76", false)]
    #[test_case("R16CO5Y76E1", false)]
    fn test_unii(code: &str, expected: bool) {
        assert_eq!(is_unii(code), expected);
    }

    #[test]
    fn test_uuid() {
        assert!(is_uuid("a8f5e2c1-3b4d-4e6f-9a7b-1c2d3e4f5a6b"));
        assert!(!is_uuid("a8f5e2c13b4d4e6f9a7b1c2d3e4f5a6b"));
        assert!(!is_uuid("not-a-uuid"));
    }

    #[test_case("20240901", Some((2024, 9, 1)))]
    #[test_case("20240901120000", Some((2024, 9, 1)))]
    #[test_case("20240901120000-0500", Some((2024, 9, 1)))]
    #[test_case("20241301", None)]
    #[test_case("2024-09-01", None)]
    #[test_case("2024", None)]
    #[test_case("202409011", None)]
    fn test_effective_date(value: &str, expected: Option<(i32, u32, u32)>) {
        let expected = expected.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        assert_eq!(effective_date(value), expected);
    }
}
