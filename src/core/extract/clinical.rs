//! Clinical section extraction
//!
//! Tags a section with its semantic type and turns its narrative block into plain text with
//! the media it renders.

use super::narrative;
use super::ExtractContext;
use crate::domain::diagnostics::codes;
use crate::domain::{Diagnostic, MediaReference, SectionKind, SectionType};
use crate::markup::navigator::{attr, child};
use crate::markup::QName;
use roxmltree::Node;

/// What the clinical extractor produces for one section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicalContent {
    pub kind: SectionKind,
    pub text: Option<String>,
    pub media: Vec<MediaReference>,
}

/// Classifies a LOINC code, keeping unknown codes as raw text
pub fn classify(code: Option<&str>) -> SectionKind {
    match code.and_then(SectionType::from_loinc) {
        Some(section_type) => SectionKind::Known { section_type },
        None => SectionKind::Unclassified {
            raw_code: code.map(str::to_string),
        },
    }
}

/// Extracts type, narrative and media of a section
///
/// Media ids that do not match any `observationMedia` in the document are reported as
/// warnings and left out.
pub fn extract_clinical(
    section: Node<'_, '_>,
    field_path: &str,
    ctx: &mut ExtractContext,
) -> ClinicalContent {
    let code = child(section, QName::hl7("code")).and_then(|c| attr(c, "code"));
    let kind = classify(code);

    let rendered = child(section, QName::hl7("text"))
        .map(narrative::render)
        .unwrap_or_default();

    let mut media = Vec::with_capacity(rendered.media_ids.len());
    for id in rendered.media_ids {
        if media.iter().any(|m: &MediaReference| m.id == id) {
            continue;
        }
        match ctx.media.resolve(&id) {
            Some(reference) => media.push(reference),
            None => ctx.diagnostics.push(Diagnostic::warning(
                codes::MEDIA_REFERENCE_UNRESOLVED,
                format!("{field_path}.media"),
                format!("renderMultiMedia refers to unknown media object '{id}'"),
            )),
        }
    }

    ClinicalContent {
        kind,
        text: rendered.text,
        media,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::MediaIndex;
    use crate::markup::Navigator;

    const WARNINGS: &str = r#"<document xmlns="urn:hl7-org:v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<section>
  <code code="34071-1" codeSystem="2.16.840.1.113883.6.1"/>
  <text>
    <paragraph>Reye's syndrome: children and teenagers should not use this medicine.</paragraph>
    <renderMultiMedia referencedObject="MM1"/>
    <renderMultiMedia referencedObject="MM1"/>
    <renderMultiMedia referencedObject="MISSING"/>
  </text>
  <component><observationMedia ID="MM1">
    <value xsi:type="ED" mediaType="image/jpeg"><reference value="warning.jpg"/></value>
  </observationMedia></component>
</section>
</document>"#;

    #[test]
    fn test_extract_clinical() {
        let nav = Navigator::parse(WARNINGS).unwrap();
        let section = nav.root().first_element_child().unwrap();
        let mut ctx = ExtractContext::new(MediaIndex::build(nav.root()));

        let content = extract_clinical(section, "sections[0]", &mut ctx);

        assert_eq!(
            content.kind,
            SectionKind::Known {
                section_type: SectionType::Warnings
            }
        );
        assert!(content.text.unwrap().starts_with("Reye's syndrome"));
        assert_eq!(content.media.len(), 1);
        assert_eq!(content.media[0].reference.as_deref(), Some("warning.jpg"));

        let unresolved: Vec<_> = ctx
            .diagnostics
            .with_code(codes::MEDIA_REFERENCE_UNRESOLVED)
            .collect();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].field_path, "sections[0].media");
        assert!(ctx.media.unreferenced().is_empty());
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(Some("34067-9")),
            SectionKind::Known {
                section_type: SectionType::IndicationsAndUsage
            }
        );
        assert_eq!(
            classify(Some("00000-0")),
            SectionKind::Unclassified {
                raw_code: Some("00000-0".to_string())
            }
        );
        assert_eq!(classify(None), SectionKind::Unclassified { raw_code: None });
    }

    #[test]
    fn test_section_without_text() {
        let nav = Navigator::parse(r#"<section xmlns="urn:hl7-org:v3"><title>Empty</title></section>"#)
            .unwrap();
        let mut ctx = ExtractContext::default();
        let content = extract_clinical(nav.root(), "sections[0]", &mut ctx);
        assert_eq!(content.text, None);
        assert!(content.media.is_empty());
        assert!(content.kind.is_unclassified());
    }
}
