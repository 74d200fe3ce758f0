//! Ingredient extraction
//!
//! Classification comes from the `classCode` marker, substance identity from the
//! `ingredientSubstance` code and name, and strength from the quantity pair. Substances and
//! active moieties are registered in the document's dedup table; the ingredient keeps only
//! their keys.

use super::quantity::{normalize_quantity, QuantityOutcome, RawQuantity};
use super::ExtractContext;
use crate::domain::diagnostics::codes;
use crate::domain::{Diagnostic, Ingredient, IngredientClass, Substance, SubstanceKey};
use crate::markup::navigator::{attr, child, is_named, path, text};
use crate::markup::QName;
use roxmltree::Node;

/// Element names that hold the substance of an ingredient
///
/// `ingredientSubstance` is current; the other two come from older document revisions that
/// used `activeIngredient`/`inactiveIngredient` instead of a class marker.
const SUBSTANCE_ELEMENTS: [&str; 3] = [
    "ingredientSubstance",
    "activeIngredientSubstance",
    "inactiveIngredientSubstance",
];

/// Whether `node` is an ingredient element in either markup revision
pub fn is_ingredient(node: Node<'_, '_>) -> bool {
    ["ingredient", "activeIngredient", "inactiveIngredient"]
        .iter()
        .any(|name| is_named(node, QName::hl7(name)))
}

/// Extracts one ingredient
///
/// Never fails: an unknown class is treated as inactive, a missing identity leaves the
/// substance unset, and quantity problems are handled by the normalizer. Each case is
/// reported under `field_path`.
pub fn extract_ingredient(
    node: Node<'_, '_>,
    field_path: &str,
    ctx: &mut ExtractContext,
) -> Ingredient {
    let class_code = attr(node, "classCode").map(str::to_string);
    let class = classify(node, class_code.as_deref(), field_path, ctx);

    let substance_node = SUBSTANCE_ELEMENTS
        .iter()
        .find_map(|name| child(node, QName::hl7(name)));

    let substance = match substance_node.and_then(identify) {
        Some(candidate) => Some(ctx.substances.resolve(candidate)),
        None => {
            ctx.diagnostics.push(Diagnostic::warning(
                codes::SUBSTANCE_UNIDENTIFIED,
                format!("{field_path}.substance"),
                "ingredient has neither a substance code nor a substance name",
            ));
            None
        }
    };

    let active_moiety = substance_node
        .and_then(|s| child(s, QName::hl7("activeMoiety")))
        .and_then(|outer| resolve_moiety(outer, field_path, ctx));

    let (quantity, invalid_quantity) = match child(node, QName::hl7("quantity")) {
        Some(quantity) => match normalize_quantity(
            RawQuantity::from_node(quantity),
            &format!("{field_path}.quantity"),
            &mut ctx.diagnostics,
        ) {
            QuantityOutcome::Parsed(q) => (Some(q), None),
            QuantityOutcome::Invalid(raw) => (None, Some(raw)),
        },
        None => (None, None),
    };

    Ingredient {
        class,
        class_code,
        substance,
        quantity,
        invalid_quantity,
        active_moiety,
    }
}

fn classify(
    node: Node<'_, '_>,
    class_code: Option<&str>,
    field_path: &str,
    ctx: &mut ExtractContext,
) -> IngredientClass {
    if let Some(class) = class_code.and_then(IngredientClass::from_class_code) {
        return class;
    }
    if class_code.is_none() {
        if is_named(node, QName::hl7("activeIngredient")) {
            return IngredientClass::Active;
        }
        if is_named(node, QName::hl7("inactiveIngredient")) {
            return IngredientClass::Inactive;
        }
    }

    ctx.diagnostics.push(Diagnostic::warning(
        codes::INGREDIENT_CLASS_UNKNOWN,
        format!("{field_path}.class"),
        format!(
            "ingredient class '{}' is not recognized; treated as inactive",
            class_code.unwrap_or_default()
        ),
    ));
    IngredientClass::Inactive
}

fn identify(substance: Node<'_, '_>) -> Option<Substance> {
    let code = child(substance, QName::hl7("code"));
    let name = child(substance, QName::hl7("name")).and_then(text);
    Substance::identify(
        code.and_then(|c| attr(c, "code")),
        code.and_then(|c| attr(c, "codeSystem")),
        name.as_deref(),
    )
}

/// Resolves `activeMoiety/activeMoiety` into the substance table
///
/// The moiety is registered like any other substance so its name and code travel with the
/// document; a moiety that differs from its ingredient substance adds a table entry.
fn resolve_moiety(
    outer: Node<'_, '_>,
    field_path: &str,
    ctx: &mut ExtractContext,
) -> Option<SubstanceKey> {
    let inner = path(outer, &[QName::hl7("activeMoiety")]).unwrap_or(outer);
    match identify(inner) {
        Some(candidate) => Some(ctx.substances.resolve(candidate)),
        None => {
            ctx.diagnostics.push(Diagnostic::warning(
                codes::UNRESOLVED_MOIETY,
                format!("{field_path}.active_moiety"),
                "active moiety is declared but carries no code or name",
            ));
            None
        }
    }
}
