//! Manufactured product extraction
//!
//! A product listing holds `subject/manufacturedProduct`, which wraps the product itself
//! (`manufacturedProduct` or, in older revisions, `manufacturedMedicine`) together with its
//! regulatory context (`subjectOf`, `consumedIn`). Both levels are read.

use super::ingredient::{extract_ingredient, is_ingredient};
use super::quantity::{normalize_quantity, parse_measure, QuantityOutcome, RawQuantity};
use super::{coded_value, ExtractContext};
use crate::domain::diagnostics::codes;
use crate::domain::{
    Approval, Characteristic, CharacteristicValue, CodedValue, Diagnostic, Diagnostics,
    DosageForm, ManufacturedProduct, MarketingAct, MediaReference, PackagingConfiguration, Route,
    SplError,
};
use crate::markup::navigator::{attr, child, children, own_text, path, path_all, text, xsi_type};
use crate::markup::QName;
use roxmltree::Node;

/// Extracts one product from its outer `manufacturedProduct` element
///
/// # Errors
///
/// Returns every missing identity field (product code, any name) as
/// [`SplError::MissingRequiredField`]. Nothing is added to the substance table in that case.
pub fn extract_product(
    outer: Node<'_, '_>,
    field_path: &str,
    ctx: &mut ExtractContext,
) -> Result<ManufacturedProduct, Vec<SplError>> {
    let inner = child(outer, QName::hl7("manufacturedProduct"))
        .or_else(|| child(outer, QName::hl7("manufacturedMedicine")))
        .unwrap_or(outer);

    let code = child(inner, QName::hl7("code")).and_then(coded_value);
    let name_node = child(inner, QName::hl7("name"));
    let name = name_node.and_then(own_text);
    let suffix = name_node
        .and_then(|n| child(n, QName::hl7("suffix")))
        .and_then(text);
    let generic_names = generic_names(inner);

    let mut missing = Vec::new();
    if code.is_none() {
        missing.push(SplError::missing(format!("{field_path}.code")));
    }
    if name.is_none() && generic_names.is_empty() {
        missing.push(SplError::missing(format!("{field_path}.name")));
    }
    let Some(code) = code else {
        return Err(missing);
    };
    if !missing.is_empty() {
        return Err(missing);
    }

    let dosage_form = child(inner, QName::hl7("formCode")).and_then(coded_value);
    let form_name = dosage_form
        .as_ref()
        .and_then(|f| f.display_name.as_deref())
        .and_then(DosageForm::from_display_name);
    let route = route(outer).or_else(|| route(inner));
    let route_name = route
        .as_ref()
        .and_then(|r| r.display_name.as_deref())
        .and_then(Route::from_display_name);

    let ingredients = inner
        .children()
        .filter(|c| is_ingredient(*c))
        .enumerate()
        .map(|(i, node)| extract_ingredient(node, &format!("{field_path}.ingredients[{i}]"), ctx))
        .collect();

    let mut packaging = Vec::new();
    for content in children(inner, QName::hl7("asContent")) {
        collect_packaging(content, 0, field_path, &mut packaging, ctx);
    }

    let subject_of: Vec<Node<'_, '_>> = if inner == outer {
        children(outer, QName::hl7("subjectOf")).collect()
    } else {
        children(outer, QName::hl7("subjectOf"))
            .chain(children(inner, QName::hl7("subjectOf")))
            .collect()
    };

    let approvals = subject_of
        .iter()
        .filter_map(|s| child(*s, QName::hl7("approval")))
        .map(approval)
        .collect();
    let marketing_acts = subject_of
        .iter()
        .filter_map(|s| child(*s, QName::hl7("marketingAct")))
        .map(marketing_act)
        .collect();

    let mut media = Vec::new();
    let characteristics = subject_of
        .iter()
        .filter_map(|s| child(*s, QName::hl7("characteristic")))
        .enumerate()
        .filter_map(|(i, node)| {
            characteristic(
                node,
                &format!("{field_path}.characteristics[{i}]"),
                &mut media,
                ctx,
            )
        })
        .collect();

    Ok(ManufacturedProduct {
        code,
        name,
        suffix,
        dosage_form,
        form_name,
        route,
        route_name,
        generic_names,
        ingredients,
        packaging,
        approvals,
        marketing_acts,
        characteristics,
        media,
    })
}

fn generic_names(inner: Node<'_, '_>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let nodes = path_all(
        inner,
        &[
            QName::hl7("asEntityWithGeneric"),
            QName::hl7("genericMedicine"),
            QName::hl7("name"),
        ],
    );
    for name in nodes.into_iter().filter_map(text) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn route(node: Node<'_, '_>) -> Option<CodedValue> {
    children(node, QName::hl7("consumedIn"))
        .filter_map(|c| {
            path(
                c,
                &[QName::hl7("substanceAdministration"), QName::hl7("routeCode")],
            )
        })
        .find_map(coded_value)
}

/// Flattens nested `asContent/containerPackagedProduct` chains depth-first
fn collect_packaging(
    content: Node<'_, '_>,
    level: u32,
    field_path: &str,
    out: &mut Vec<PackagingConfiguration>,
    ctx: &mut ExtractContext,
) {
    let index = out.len();
    let quantity = child(content, QName::hl7("quantity")).and_then(|q| {
        match normalize_quantity(
            RawQuantity::from_node(q),
            &format!("{field_path}.packaging[{index}].quantity"),
            &mut ctx.diagnostics,
        ) {
            QuantityOutcome::Parsed(quantity) => Some(quantity),
            QuantityOutcome::Invalid(_) => None,
        }
    });
    let container = child(content, QName::hl7("containerPackagedProduct"))
        .or_else(|| child(content, QName::hl7("containerPackagedMedicine")));

    out.push(PackagingConfiguration {
        level,
        quantity,
        package_code: container
            .and_then(|c| child(c, QName::hl7("code")))
            .and_then(coded_value),
        form: container
            .and_then(|c| child(c, QName::hl7("formCode")))
            .and_then(coded_value),
    });

    if let Some(container) = container {
        for nested in children(container, QName::hl7("asContent")) {
            collect_packaging(nested, level + 1, field_path, out, ctx);
        }
    }
}

fn approval(node: Node<'_, '_>) -> Approval {
    let id = child(node, QName::hl7("id"));
    Approval {
        id: id
            .and_then(|i| attr(i, "extension").or_else(|| attr(i, "root")))
            .map(str::to_string),
        code: child(node, QName::hl7("code")).and_then(coded_value),
        territory: path(
            node,
            &[
                QName::hl7("author"),
                QName::hl7("territorialAuthority"),
                QName::hl7("territory"),
                QName::hl7("code"),
            ],
        )
        .and_then(|c| attr(c, "code"))
        .map(str::to_string),
    }
}

fn marketing_act(node: Node<'_, '_>) -> MarketingAct {
    let effective = child(node, QName::hl7("effectiveTime"));
    let bound = |name: &str| {
        effective
            .and_then(|e| child(e, QName::hl7(name)))
            .and_then(|b| attr(b, "value"))
            .map(str::to_string)
    };
    MarketingAct {
        code: child(node, QName::hl7("code")).and_then(coded_value),
        status: child(node, QName::hl7("statusCode"))
            .and_then(|s| attr(s, "code"))
            .map(str::to_string),
        effective_low: bound("low"),
        effective_high: bound("high"),
    }
}

/// Reads one characteristic by the `xsi:type` of its value
///
/// Returns `None` only when there is no value element at all.
fn characteristic(
    node: Node<'_, '_>,
    field_path: &str,
    media: &mut Vec<MediaReference>,
    ctx: &mut ExtractContext,
) -> Option<Characteristic> {
    let code = child(node, QName::hl7("code")).and_then(coded_value);
    let Some(value) = child(node, QName::hl7("value")) else {
        ctx.diagnostics.push(Diagnostic::warning(
            codes::CHARACTERISTIC_VALUE_INVALID,
            format!("{field_path}.value"),
            "characteristic has no value",
        ));
        return None;
    };

    let value_type = xsi_type(value);
    let raw_text = || {
        text(value)
            .or_else(|| attr(value, "value").map(str::to_string))
            .or_else(|| attr(value, "code").map(str::to_string))
            .unwrap_or_default()
    };
    let raw = |text: String| CharacteristicValue::Raw {
        value_type: value_type.map(str::to_string),
        text,
    };

    let parsed = match value_type {
        Some("CE" | "CV" | "CD" | "CO") => {
            coded_value(value).map(|value| CharacteristicValue::Coded { value })
        }
        Some("INT") => attr(value, "value")
            .and_then(|v| v.parse::<i64>().ok())
            .map(|value| CharacteristicValue::Integer { value }),
        Some("PQ") => parse_measure(value, &format!("{field_path}.value"), &mut ctx.diagnostics)
            .map(|value| CharacteristicValue::Quantity { value }),
        Some("IVL_PQ") => {
            let bound = |name: &str, diagnostics: &mut Diagnostics| {
                child(value, QName::hl7(name))
                    .and_then(|b| parse_measure(b, &format!("{field_path}.value.{name}"), diagnostics))
            };
            let low = bound("low", &mut ctx.diagnostics);
            let high = bound("high", &mut ctx.diagnostics);
            (low.is_some() || high.is_some()).then_some(CharacteristicValue::Range { low, high })
        }
        Some("BL") => match attr(value, "value") {
            Some("true") => Some(CharacteristicValue::Boolean { value: true }),
            Some("false") => Some(CharacteristicValue::Boolean { value: false }),
            _ => None,
        },
        Some("ST") => text(value).map(|value| CharacteristicValue::Text { value }),
        Some("ED") => {
            let reference = child(value, QName::hl7("reference"))
                .and_then(|r| attr(r, "value"))
                .map(str::to_string);
            if let Some(reference) = &reference {
                media.push(MediaReference {
                    id: attr(value, "ID").unwrap_or(reference.as_str()).to_string(),
                    media_type: attr(value, "mediaType").map(str::to_string),
                    reference: Some(reference.clone()),
                    description: text(value),
                });
            }
            text(value)
                .or(reference)
                .map(|value| CharacteristicValue::Text { value })
        }
        other => {
            ctx.diagnostics.push(Diagnostic::warning(
                codes::CHARACTERISTIC_TYPE_UNKNOWN,
                format!("{field_path}.value"),
                format!(
                    "characteristic value type '{}' is not supported; kept as raw text",
                    other.unwrap_or("none")
                ),
            ));
            return Some(Characteristic {
                code,
                value: raw(raw_text()),
            });
        }
    };

    let value = parsed.unwrap_or_else(|| {
        ctx.diagnostics.push(Diagnostic::warning(
            codes::CHARACTERISTIC_VALUE_INVALID,
            format!("{field_path}.value"),
            format!(
                "characteristic value does not match its declared type {}; kept as raw text",
                value_type.unwrap_or_default()
            ),
        ));
        raw(raw_text())
    });
    Some(Characteristic { code, value })
}
