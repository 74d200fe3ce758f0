//! Document validator
//!
//! Runs once over a fully assembled [`Document`] and reports findings as diagnostics. It
//! never mutates the document and never fails.
//!
//! The assembler registers every substance and active moiety it reads, so the reference
//! checks only fire for documents that reach [`Validator::validate`] some other way, such as
//! stored JSON that was edited or produced by another tool.

use super::formats;
use crate::domain::codes::{self as code_systems, code_system_name};
use crate::domain::diagnostics::codes;
use crate::domain::{
    CodedValue, Diagnostic, Diagnostics, Document, DosageForm, IngredientClass,
    ManufacturedProduct, Measure, Quantity, Severity, SubstanceKey,
};
use std::collections::{BTreeMap, HashSet};

/// Validator settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Report unknown code systems as warnings instead of info
    pub strict_code_systems: bool,
}

/// Structural, referential and format checks over an assembled document
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidationOptions,
}

impl Validator {
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    /// Validates a document, returning diagnostics in check order
    pub fn validate(&self, document: &Document) -> Diagnostics {
        let mut out = Diagnostics::new();
        self.check_header(document, &mut out);
        self.check_sections(document, &mut out);
        for (path, product) in document.products() {
            self.check_product(document, &path, product, &mut out);
        }
        out
    }

    fn check_header(&self, document: &Document, out: &mut Diagnostics) {
        match document.id.as_deref() {
            None => out.push(Diagnostic::error(
                codes::MISSING_DOCUMENT_ID,
                "id",
                "document has no identifier",
            )),
            Some(id) if !formats::is_uuid(id) => out.push(Diagnostic::warning(
                codes::INVALID_UUID,
                "id",
                format!("document identifier '{id}' is not a UUID"),
            )),
            Some(_) => {}
        }

        match document.set_id.as_deref() {
            None => out.push(Diagnostic::error(
                codes::MISSING_SET_ID,
                "set_id",
                "document has no set identifier",
            )),
            Some(set_id) if !formats::is_uuid(set_id) => out.push(Diagnostic::warning(
                codes::INVALID_UUID,
                "set_id",
                format!("set identifier '{set_id}' is not a UUID"),
            )),
            Some(_) => {}
        }

        match document.version {
            Some(version) if version > 0 => {}
            Some(version) => out.push(Diagnostic::error(
                codes::INVALID_VERSION,
                "version",
                format!("version {version} is not a positive integer"),
            )),
            None => out.push(Diagnostic::error(
                codes::INVALID_VERSION,
                "version",
                "version is missing or not a positive integer",
            )),
        }

        match (&document.effective_time, &document.effective_date) {
            (None, _) => out.push(Diagnostic::warning(
                codes::MISSING_EFFECTIVE_TIME,
                "effective_time",
                "document has no effective time",
            )),
            (Some(raw), None) => out.push(Diagnostic::warning(
                codes::INVALID_DATE,
                "effective_time",
                format!("effective time '{raw}' is not a YYYYMMDD date"),
            )),
            (Some(_), Some(_)) => {}
        }

        if let Some(document_type) = &document.document_type {
            self.check_code_system(document_type, "document_type", out);
        }
    }

    fn check_sections(&self, document: &Document, out: &mut Diagnostics) {
        if document.sections.is_empty() {
            out.push(Diagnostic::warning(
                codes::NO_SECTIONS,
                "sections",
                "document has no sections",
            ));
            return;
        }

        let mut occurrences: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        let mut first_seen: Vec<&str> = Vec::new();
        for (path, section) in document.walk_sections() {
            match section.id.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() => {
                    let paths = occurrences.entry(id).or_default();
                    if paths.is_empty() {
                        first_seen.push(id);
                    }
                    paths.push(path.clone());
                }
                _ => out.push(Diagnostic::error(
                    codes::MISSING_SECTION_ID,
                    format!("{path}.id"),
                    "section has no identifier",
                )),
            }
            if let Some(code) = &section.code {
                self.check_code_system(code, &format!("{path}.code"), out);
            }
        }

        for id in first_seen {
            let paths = &occurrences[id];
            if paths.len() > 1 {
                out.push(Diagnostic::error(
                    codes::DUPLICATE_SECTION_ID,
                    paths[0].clone(),
                    format!(
                        "section identifier '{id}' appears {} times: {}",
                        paths.len(),
                        paths.join(", ")
                    ),
                ));
            }
        }
    }

    fn check_product(
        &self,
        document: &Document,
        path: &str,
        product: &ManufacturedProduct,
        out: &mut Diagnostics,
    ) {
        if product.code.is_in(code_systems::NDC) && !formats::is_ndc_product_code(&product.code.code)
        {
            out.push(Diagnostic::error(
                codes::INVALID_NDC,
                format!("{path}.code"),
                format!("'{}' is not an NDC product code", product.code.code),
            ));
        }
        self.check_code_system(&product.code, &format!("{path}.code"), out);

        if product.name.is_none() {
            out.push(Diagnostic::warning(
                codes::MISSING_PRODUCT_NAME,
                format!("{path}.name"),
                "product has no proprietary name",
            ));
        }

        if let (Some(form), Some(route)) = (product.form_name, product.route_name) {
            if route.accepts(form) == Some(false) {
                out.push(Diagnostic::warning(
                    codes::ROUTE_FORM_MISMATCH,
                    format!("{path}.route"),
                    format!("dosage form '{form}' is not given by the {route} route"),
                ));
            }
        }

        for (i, package) in product.packaging.iter().enumerate() {
            let package_path = format!("{path}.packaging[{i}]");
            if let Some(code) = &package.package_code {
                if code.is_in(code_systems::NDC) && !formats::is_ndc_package_code(&code.code) {
                    out.push(Diagnostic::error(
                        codes::INVALID_NDC,
                        format!("{package_path}.package_code"),
                        format!("'{}' is not an NDC package code", code.code),
                    ));
                }
            }
            if let Some(quantity) = &package.quantity {
                check_quantity(quantity, &format!("{package_path}.quantity"), out);
            }
        }

        let known: HashSet<&SubstanceKey> = document.substances.iter().map(|s| &s.key).collect();
        for (i, ingredient) in product.ingredients.iter().enumerate() {
            let ingredient_path = format!("{path}.ingredients[{i}]");

            if let Some(quantity) = &ingredient.quantity {
                let quantity_path = format!("{ingredient_path}.quantity");
                check_quantity(quantity, &quantity_path, out);
                if ingredient.class == IngredientClass::Active {
                    check_strength(quantity, product.form_name, &quantity_path, out);
                }
            }

            if let Some(key) = &ingredient.substance {
                if !known.contains(key) {
                    out.push(Diagnostic::warning(
                        codes::UNRESOLVED_SUBSTANCE,
                        format!("{ingredient_path}.substance"),
                        format!("substance {key} is not in the document substance list"),
                    ));
                }
                check_unii(key, &format!("{ingredient_path}.substance"), out);
            }

            if ingredient.class == IngredientClass::Active {
                if let Some(moiety) = &ingredient.active_moiety {
                    // Moieties are registered alongside substances by the extractor
                    if !known.contains(moiety) {
                        out.push(Diagnostic::warning(
                            codes::UNRESOLVED_MOIETY,
                            format!("{ingredient_path}.active_moiety"),
                            format!("active moiety {moiety} is not in the document substance list"),
                        ));
                    }
                    check_unii(moiety, &format!("{ingredient_path}.active_moiety"), out);
                }
            }
        }
    }

    fn check_code_system(&self, value: &CodedValue, field_path: &str, out: &mut Diagnostics) {
        let Some(code_system) = value.code_system.as_deref() else {
            return;
        };
        if code_system_name(code_system).is_some() {
            return;
        }
        let severity = if self.options.strict_code_systems {
            Severity::Warning
        } else {
            Severity::Info
        };
        out.push(Diagnostic::new(
            severity,
            codes::UNKNOWN_CODE_SYSTEM,
            field_path,
            format!("code system '{code_system}' is not a known SPL code system"),
        ));
    }
}

fn check_quantity(quantity: &Quantity, field_path: &str, out: &mut Diagnostics) {
    if quantity.numerator.value.is_negative() {
        out.push(Diagnostic::error(
            codes::INVALID_QUANTITY,
            format!("{field_path}.numerator"),
            format!("numerator {} is negative", quantity.numerator.value),
        ));
    }
    if quantity.denominator.value.is_zero() {
        out.push(Diagnostic::error(
            codes::INVALID_QUANTITY,
            format!("{field_path}.denominator"),
            "denominator is zero",
        ));
    }
}

/// Active strength above this many mg per unit is implausible for any form
const MAX_STRENGTH_MG: f64 = 10_000.0;

fn milligrams(measure: &Measure) -> Option<f64> {
    let factor = match measure.unit.as_str() {
        "kg" => 1_000_000.0,
        "g" => 1_000.0,
        "mg" => 1.0,
        "mcg" => 0.001,
        "ng" => 0.000_001,
        _ => return None,
    };
    Some(measure.value.as_f64() * factor)
}

/// Flags active strengths outside the plausible range for the product's form
///
/// Only mass numerators are checked. A mass denominator other than the implicit one (same
/// unit, value 1) makes the quantity a concentration, which is left alone.
fn check_strength(
    quantity: &Quantity,
    form: Option<DosageForm>,
    field_path: &str,
    out: &mut Diagnostics,
) {
    let Some(amount) = milligrams(&quantity.numerator) else {
        return;
    };
    let per = quantity.denominator.value.as_f64();
    if amount < 0.0 || per <= 0.0 {
        return;
    }
    let implicit = quantity.denominator.unit == quantity.numerator.unit && per == 1.0;
    if milligrams(&quantity.denominator).is_some() && !implicit {
        return;
    }

    let strength = amount / per;
    let (low, high) = form
        .and_then(|f| f.strength_range_mg())
        .unwrap_or((0.0, MAX_STRENGTH_MG));
    let context = form.map(|f| format!(" for a {f}")).unwrap_or_default();

    if strength == 0.0 {
        out.push(Diagnostic::warning(
            codes::IMPLAUSIBLE_STRENGTH,
            field_path,
            "active ingredient strength is zero",
        ));
    } else if strength < low || strength > high {
        out.push(Diagnostic::warning(
            codes::IMPLAUSIBLE_STRENGTH,
            field_path,
            format!("active strength {quantity} is outside {low}..{high} mg{context}"),
        ));
    }
}

fn check_unii(key: &SubstanceKey, field_path: &str, out: &mut Diagnostics) {
    if let SubstanceKey::Code { code, code_system } = key {
        if code_system == code_systems::UNII && !formats::is_unii(code) {
            out.push(Diagnostic::error(
                codes::INVALID_UNII,
                field_path,
                format!("'{code}' is not a UNII"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DecimalValue, Ingredient, Measure, PackagingConfiguration, Route, Section, SectionKind,
        SourceId, Substance,
    };
    use test_case::test_case;

    const DOC_ID: &str = "a8f5e2c1-3b4d-4e6f-9a7b-1c2d3e4f5a6b";
    const SET_ID: &str = "0b6c5d4e-3f2a-4b1c-8d9e-0f1a2b3c4d5e";

    fn section(id: Option<&str>) -> Section {
        Section {
            id: id.map(str::to_string),
            xml_id: None,
            code: Some(CodedValue::new("34071-1").with_code_system(code_systems::LOINC)),
            kind: SectionKind::Unclassified { raw_code: None },
            title: None,
            index: 0,
            effective_time: None,
            text: None,
            products: Vec::new(),
            media: Vec::new(),
            children: Vec::new(),
        }
    }

    fn product(code: &str) -> ManufacturedProduct {
        ManufacturedProduct {
            code: CodedValue::new(code).with_code_system(code_systems::NDC),
            name: Some("Aspirin".to_string()),
            suffix: None,
            dosage_form: None,
            form_name: None,
            route: None,
            route_name: None,
            generic_names: Vec::new(),
            ingredients: Vec::new(),
            packaging: Vec::new(),
            approvals: Vec::new(),
            marketing_acts: Vec::new(),
            characteristics: Vec::new(),
            media: Vec::new(),
        }
    }

    fn document(sections: Vec<Section>) -> Document {
        Document {
            id: Some(DOC_ID.to_string()),
            set_id: Some(SET_ID.to_string()),
            version: Some(3),
            effective_time: Some("20240901".to_string()),
            effective_date: formats::effective_date("20240901"),
            document_type: Some(CodedValue::new("34390-5").with_code_system(code_systems::LOINC)),
            title: None,
            author: None,
            organizations: Vec::new(),
            sections,
            substances: Vec::new(),
            media: Vec::new(),
            source: SourceId::new("test.xml").unwrap(),
        }
    }

    fn quantity(numerator: &str, denominator: &str) -> Quantity {
        Quantity {
            numerator: Measure::new(DecimalValue::parse(numerator).unwrap(), "mg"),
            denominator: Measure::new(DecimalValue::parse(denominator).unwrap(), "1"),
        }
    }

    #[test]
    fn test_clean_document_has_no_findings() {
        let diagnostics = Validator::default().validate(&document(vec![section(Some("s1"))]));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_header_checks() {
        let mut doc = document(vec![section(Some("s1"))]);
        doc.id = None;
        doc.set_id = Some("set-1".to_string());
        doc.version = Some(0);
        doc.effective_time = Some("2024".to_string());
        doc.effective_date = None;

        let diagnostics = Validator::default().validate(&doc);
        assert_eq!(diagnostics.with_code(codes::MISSING_DOCUMENT_ID).count(), 1);
        assert_eq!(diagnostics.with_code(codes::INVALID_UUID).count(), 1);
        assert_eq!(diagnostics.with_code(codes::INVALID_VERSION).count(), 1);
        assert_eq!(diagnostics.with_code(codes::INVALID_DATE).count(), 1);
    }

    #[test]
    fn test_duplicate_section_ids_reported_once() {
        let mut parent = section(Some("34067-1"));
        parent.children.push(section(Some("34067-1")));
        let doc = document(vec![parent, section(Some("other")), section(Some("  "))]);

        let diagnostics = Validator::default().validate(&doc);
        let duplicates: Vec<_> = diagnostics.with_code(codes::DUPLICATE_SECTION_ID).collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].severity, Severity::Error);
        assert!(duplicates[0].message.contains("sections[0]"));
        assert!(duplicates[0].message.contains("sections[0].children[0]"));
        assert_eq!(diagnostics.with_code(codes::MISSING_SECTION_ID).count(), 1);
    }

    #[test]
    fn test_no_sections_is_warning() {
        let diagnostics = Validator::default().validate(&document(Vec::new()));
        let findings: Vec<_> = diagnostics.with_code(codes::NO_SECTIONS).collect();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_product_checks() {
        let mut listing = section(Some("p"));
        let mut bad = product("03630160");
        bad.name = None;
        bad.packaging.push(PackagingConfiguration {
            level: 0,
            quantity: Some(quantity("100", "0")),
            package_code: Some(CodedValue::new("0363-0160-001").with_code_system(code_systems::NDC)),
            form: None,
        });
        let substance =
            Substance::identify(Some("R16CO5Y76E"), Some(code_systems::UNII), Some("ASPIRIN")).unwrap();
        let orphan = Substance::identify(Some("BADUNII"), Some(code_systems::UNII), None).unwrap();
        bad.ingredients.push(Ingredient {
            class: IngredientClass::Active,
            class_code: Some("ACTIB".to_string()),
            substance: Some(substance.key.clone()),
            quantity: Some(quantity("-1", "1")),
            invalid_quantity: None,
            active_moiety: Some(orphan.key.clone()),
        });
        listing.products.push(bad);

        let mut doc = document(vec![listing]);
        doc.substances.push(substance);

        let diagnostics = Validator::default().validate(&doc);
        assert_eq!(diagnostics.with_code(codes::INVALID_NDC).count(), 2);
        assert_eq!(diagnostics.with_code(codes::MISSING_PRODUCT_NAME).count(), 1);
        assert_eq!(diagnostics.with_code(codes::INVALID_QUANTITY).count(), 2);
        assert_eq!(diagnostics.with_code(codes::UNRESOLVED_MOIETY).count(), 1);
        assert_eq!(diagnostics.with_code(codes::INVALID_UNII).count(), 1);
        assert_eq!(diagnostics.with_code(codes::UNRESOLVED_SUBSTANCE).count(), 0);
        assert_eq!(
            diagnostics
                .with_code(codes::INVALID_QUANTITY)
                .next()
                .unwrap()
                .field_path,
            "sections[0].products[0].packaging[0].quantity.denominator"
        );
    }

    fn listing(product: ManufacturedProduct) -> Document {
        let mut listing = section(Some("p"));
        listing.products.push(product);
        document(vec![listing])
    }

    fn active(quantity: Quantity) -> Ingredient {
        Ingredient {
            class: IngredientClass::Active,
            class_code: Some("ACTIB".to_string()),
            substance: None,
            quantity: Some(quantity),
            invalid_quantity: None,
            active_moiety: None,
        }
    }

    fn measured(numerator: (&str, &str), denominator: (&str, &str)) -> Quantity {
        Quantity {
            numerator: Measure::new(DecimalValue::parse(numerator.0).unwrap(), numerator.1),
            denominator: Measure::new(DecimalValue::parse(denominator.0).unwrap(), denominator.1),
        }
    }

    #[test_case(("325", "mg"), ("1", "mg"), Some(DosageForm::Tablet), false ; "implicit denominator")]
    #[test_case(("500", "mcg"), ("1", "1"), Some(DosageForm::Tablet), false ; "micrograms")]
    #[test_case(("5000", "mg"), ("1", "1"), Some(DosageForm::Tablet), true ; "tablet too strong")]
    #[test_case(("3", "g"), ("1", "{capsule}"), Some(DosageForm::Capsule), true ; "grams per capsule")]
    #[test_case(("50", "mg"), ("5", "mL"), Some(DosageForm::Solution), false ; "per millilitre")]
    #[test_case(("0", "mg"), ("1", "1"), None, true ; "zero")]
    #[test_case(("20", "g"), ("1", "1"), None, true ; "over general cap")]
    #[test_case(("100", "units"), ("1", "1"), Some(DosageForm::Tablet), false ; "non-mass unit")]
    #[test_case(("250", "mg"), ("1", "g"), Some(DosageForm::Cream), false ; "concentration")]
    fn test_strength_plausibility(
        numerator: (&str, &str),
        denominator: (&str, &str),
        form: Option<DosageForm>,
        flagged: bool,
    ) {
        let mut drug = product("0363-0160");
        drug.form_name = form;
        drug.ingredients.push(active(measured(numerator, denominator)));

        let diagnostics = Validator::default().validate(&listing(drug));
        let findings: Vec<_> = diagnostics.with_code(codes::IMPLAUSIBLE_STRENGTH).collect();
        assert_eq!(findings.len(), usize::from(flagged), "{diagnostics:?}");
        if flagged {
            assert_eq!(findings[0].severity, Severity::Warning);
            assert_eq!(
                findings[0].field_path,
                "sections[0].products[0].ingredients[0].quantity"
            );
        }
    }

    #[test]
    fn test_inactive_strength_is_not_checked() {
        let mut drug = product("0363-0160");
        drug.form_name = Some(DosageForm::Tablet);
        let mut filler = active(measured(("9000", "mg"), ("1", "1")));
        filler.class = IngredientClass::Inactive;
        drug.ingredients.push(filler);

        let diagnostics = Validator::default().validate(&listing(drug));
        assert_eq!(diagnostics.with_code(codes::IMPLAUSIBLE_STRENGTH).count(), 0);
    }

    #[test_case(DosageForm::Tablet, Route::Oral, false)]
    #[test_case(DosageForm::Cream, Route::Oral, true)]
    #[test_case(DosageForm::Capsule, Route::Topical, true)]
    #[test_case(DosageForm::Tablet, Route::Intravenous, true)]
    #[test_case(DosageForm::Drops, Route::Ophthalmic, false)]
    #[test_case(DosageForm::Tablet, Route::Vaginal, false)]
    fn test_route_form_compatibility(form: DosageForm, route: Route, flagged: bool) {
        let mut drug = product("0363-0160");
        drug.form_name = Some(form);
        drug.route_name = Some(route);

        let diagnostics = Validator::default().validate(&listing(drug));
        let findings: Vec<_> = diagnostics.with_code(codes::ROUTE_FORM_MISMATCH).collect();
        assert_eq!(findings.len(), usize::from(flagged));
        if flagged {
            assert_eq!(findings[0].severity, Severity::Warning);
            assert_eq!(findings[0].field_path, "sections[0].products[0].route");
        }
    }

    #[test]
    fn test_unknown_code_system_severity_follows_options() {
        let mut s = section(Some("s1"));
        s.code = Some(CodedValue::new("X").with_code_system("1.2.3.4"));
        let doc = document(vec![s]);

        let lenient = Validator::default().validate(&doc);
        assert_eq!(
            lenient.with_code(codes::UNKNOWN_CODE_SYSTEM).next().unwrap().severity,
            Severity::Info
        );

        let strict = Validator::new(ValidationOptions {
            strict_code_systems: true,
        })
        .validate(&doc);
        assert_eq!(
            strict.with_code(codes::UNKNOWN_CODE_SYSTEM).next().unwrap().severity,
            Severity::Warning
        );
    }
}
