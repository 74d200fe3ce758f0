//! Document assembler
//!
//! Runs the single-document pipeline: decode, parse, header and author metadata, section
//! routing, substance table freeze, validation. Parsing is synchronous and owns all of its
//! state; nothing is shared with other documents.

use super::router::route_sections;
use crate::core::extract::{coded_value, ExtractContext, MediaIndex};
use crate::core::validation::formats::effective_date;
use crate::core::validation::{ValidationOptions, Validator};
use crate::domain::{
    Diagnostics, Document, Organization, OrganizationRole, Result, SourceId, SplError,
};
use crate::markup::navigator::{attr, child, children, is_named, path, text};
use crate::markup::{decode, Navigator, QName};
use roxmltree::Node;
use serde::Serialize;

/// A successfully assembled document with everything found along the way
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
    pub document: Document,
    /// Extraction diagnostics followed by validation diagnostics
    pub diagnostics: Diagnostics,
}

/// Builds [`Document`]s from raw bytes
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    validator: Validator,
}

impl DocumentAssembler {
    pub fn new(options: ValidationOptions) -> Self {
        Self {
            validator: Validator::new(options),
        }
    }

    /// Parses and assembles one document
    ///
    /// # Errors
    ///
    /// Fails only when no document can be built at all: the bytes are not well-formed
    /// markup ([`SplError::MalformedMarkup`]) or the root element is not an HL7 `document`
    /// ([`SplError::InvalidFormat`]). Everything else ends up in the diagnostics.
    pub fn assemble(&self, bytes: &[u8], source: SourceId) -> Result<ParsedDocument> {
        let markup = decode(bytes)?;
        let navigator = Navigator::parse(markup)?;
        let root = navigator.root();
        if !is_named(root, QName::hl7("document")) {
            return Err(SplError::invalid(
                "document",
                format!(
                    "root element is '{}', expected an HL7 v3 document",
                    root.tag_name().name()
                ),
            ));
        }

        let mut ctx = ExtractContext::new(MediaIndex::build(root));
        let (author, organizations) = organizations(root);
        let sections = route_sections(root, &mut ctx);

        let effective_time = child(root, QName::hl7("effectiveTime"))
            .and_then(|e| attr(e, "value"))
            .map(str::to_string);
        let document = Document {
            id: root_attr(root, "id"),
            set_id: root_attr(root, "setId"),
            version: child(root, QName::hl7("versionNumber"))
                .and_then(|v| attr(v, "value"))
                .and_then(|v| v.parse::<u32>().ok()),
            effective_date: effective_time.as_deref().and_then(effective_date),
            effective_time,
            document_type: child(root, QName::hl7("code")).and_then(coded_value),
            title: child(root, QName::hl7("title")).and_then(text),
            author,
            organizations,
            sections,
            substances: std::mem::take(&mut ctx.substances).into_vec(),
            media: ctx.media.unreferenced(),
            source,
        };

        let mut diagnostics = ctx.diagnostics;
        diagnostics.extend(self.validator.validate(&document));

        tracing::debug!(
            source = %document.source,
            sections = document.sections.len(),
            substances = document.substances.len(),
            diagnostics = diagnostics.len(),
            "Document assembled"
        );

        Ok(ParsedDocument {
            document,
            diagnostics,
        })
    }
}

/// Parses one document with default validation options
pub fn parse_document(bytes: &[u8], source: SourceId) -> Result<ParsedDocument> {
    DocumentAssembler::default().assemble(bytes, source)
}

fn root_attr(root: Node<'_, '_>, element: &str) -> Option<String> {
    child(root, QName::hl7(element))
        .and_then(|e| attr(e, "root"))
        .map(str::to_string)
}

/// Reads the labeler and the registrants/establishments nested below it
///
/// Organizations are deduplicated by identity key; roles of duplicates are merged.
fn organizations(root: Node<'_, '_>) -> (Option<Organization>, Vec<Organization>) {
    let Some(labeler) = path(
        root,
        &[
            QName::hl7("author"),
            QName::hl7("assignedEntity"),
            QName::hl7("representedOrganization"),
        ],
    ) else {
        return (None, Vec::new());
    };

    let author = organization(labeler, vec![OrganizationRole::Labeler]);
    let mut found: Vec<Organization> = Vec::new();

    for registrant_entity in children(labeler, QName::hl7("assignedEntity")) {
        let Some(registrant) = child(registrant_entity, QName::hl7("assignedOrganization")) else {
            continue;
        };
        merge(
            &mut found,
            organization(registrant, vec![OrganizationRole::Registrant]),
        );

        for establishment_entity in children(registrant, QName::hl7("assignedEntity")) {
            let Some(establishment) =
                child(establishment_entity, QName::hl7("assignedOrganization"))
            else {
                continue;
            };
            let mut roles = vec![OrganizationRole::Establishment];
            let operations = children(establishment_entity, QName::hl7("performance"))
                .filter_map(|p| path(p, &[QName::hl7("actDefinition"), QName::hl7("code")]))
                .filter_map(|c| attr(c, "displayName").or_else(|| attr(c, "code")));
            for operation in operations {
                let role = OrganizationRole::from_operation(operation);
                if !roles.contains(&role) {
                    roles.push(role);
                }
            }
            merge(&mut found, organization(establishment, roles));
        }
    }

    (Some(author), found)
}

fn organization(node: Node<'_, '_>, roles: Vec<OrganizationRole>) -> Organization {
    let id = child(node, QName::hl7("id"));
    Organization {
        name: child(node, QName::hl7("name")).and_then(text),
        id_root: id.and_then(|i| attr(i, "root")).map(str::to_string),
        id_extension: id.and_then(|i| attr(i, "extension")).map(str::to_string),
        roles,
    }
}

fn merge(found: &mut Vec<Organization>, candidate: Organization) {
    let key = candidate.identity_key();
    let existing = key
        .as_ref()
        .and_then(|key| found.iter_mut().find(|o| o.identity_key().as_ref() == Some(key)));
    match existing {
        Some(existing) => {
            for role in candidate.roles {
                if !existing.roles.contains(&role) {
                    existing.roles.push(role);
                }
            }
        }
        None => found.push(candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::diagnostics::codes;
    use crate::domain::ErrorKind;

    const LABEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<document xmlns="urn:hl7-org:v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <id root="a8f5e2c1-3b4d-4e6f-9a7b-1c2d3e4f5a6b"/>
  <code code="34390-5" codeSystem="2.16.840.1.113883.6.1" displayName="HUMAN OTC DRUG LABEL"/>
  <title>Aspirin Tablets</title>
  <effectiveTime value="20240901"/>
  <setId root="0b6c5d4e-3f2a-4b1c-8d9e-0f1a2b3c4d5e"/>
  <versionNumber value="4"/>
  <author><assignedEntity><representedOrganization>
    <id extension="123456789" root="1.3.6.1.4.1.519.1"/>
    <name>Acme Labeler</name>
    <assignedEntity><assignedOrganization>
      <id extension="987654321" root="1.3.6.1.4.1.519.1"/>
      <name>Acme Registrant</name>
      <assignedEntity>
        <assignedOrganization><id extension="111111111" root="1.3.6.1.4.1.519.1"/><name>Plant One</name></assignedOrganization>
        <performance><actDefinition><code code="C43360" displayName="MANUFACTURE"/></actDefinition></performance>
        <performance><actDefinition><code code="C84731" displayName="PACK"/></actDefinition></performance>
      </assignedEntity>
    </assignedOrganization></assignedEntity>
  </representedOrganization></assignedEntity></author>
  <component><structuredBody>
    <component><section>
      <id root="1f0c1a2b-0000-4000-8000-000000000001"/>
      <code code="34071-1" codeSystem="2.16.840.1.113883.6.1"/>
      <title>Warnings</title>
      <text><paragraph>Keep out of reach of children.</paragraph></text>
    </section></component>
    <component><section>
      <id root="1f0c1a2b-0000-4000-8000-000000000002"/>
      <code code="51945-4" codeSystem="2.16.840.1.113883.6.1"/>
      <text><renderMultiMedia referencedObject="MM1"/></text>
      <component><observationMedia ID="MM1"><value xsi:type="ED" mediaType="image/jpeg"><reference value="label.jpg"/></value></observationMedia></component>
      <component><observationMedia ID="MM2"><value xsi:type="ED" mediaType="image/jpeg"><reference value="spare.jpg"/></value></observationMedia></component>
    </section></component>
  </structuredBody></component>
</document>"#;

    fn source() -> SourceId {
        SourceId::new("aspirin.xml").unwrap()
    }

    #[test]
    fn test_assemble_metadata() {
        let parsed = parse_document(LABEL.as_bytes(), source()).unwrap();
        let document = &parsed.document;

        assert_eq!(
            document.id.as_deref(),
            Some("a8f5e2c1-3b4d-4e6f-9a7b-1c2d3e4f5a6b")
        );
        assert_eq!(document.version, Some(4));
        assert_eq!(
            document.effective_date,
            chrono::NaiveDate::from_ymd_opt(2024, 9, 1)
        );
        assert_eq!(
            document.document_type.as_ref().unwrap().display_name.as_deref(),
            Some("HUMAN OTC DRUG LABEL")
        );
        assert_eq!(document.title.as_deref(), Some("Aspirin Tablets"));
        assert_eq!(document.sections.len(), 2);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    }

    #[test]
    fn test_assemble_organizations() {
        let parsed = parse_document(LABEL.as_bytes(), source()).unwrap();
        let author = parsed.document.author.unwrap();
        assert_eq!(author.name.as_deref(), Some("Acme Labeler"));
        assert_eq!(author.roles, vec![OrganizationRole::Labeler]);

        let organizations = parsed.document.organizations;
        assert_eq!(organizations.len(), 2);
        assert_eq!(organizations[0].roles, vec![OrganizationRole::Registrant]);
        assert_eq!(
            organizations[1].roles,
            vec![
                OrganizationRole::Establishment,
                OrganizationRole::Manufacturer,
                OrganizationRole::Packer
            ]
        );
    }

    #[test]
    fn test_unreferenced_media_attach_to_document() {
        let parsed = parse_document(LABEL.as_bytes(), source()).unwrap();
        assert_eq!(parsed.document.sections[1].media.len(), 1);
        assert_eq!(parsed.document.media.len(), 1);
        assert_eq!(parsed.document.media[0].id, "MM2");
    }

    #[test]
    fn test_malformed_markup_is_fatal() {
        let err = parse_document(b"<document><section></document>", source()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMarkup);
    }

    #[test]
    fn test_wrong_root_is_fatal() {
        let err = parse_document(b"<html/>", source()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_empty_document_reports_header_problems() {
        let parsed =
            parse_document(br#"<document xmlns="urn:hl7-org:v3"/>"#, source()).unwrap();
        let diagnostics = &parsed.diagnostics;
        assert_eq!(diagnostics.with_code(codes::MISSING_DOCUMENT_ID).count(), 1);
        assert_eq!(diagnostics.with_code(codes::MISSING_SET_ID).count(), 1);
        assert_eq!(diagnostics.with_code(codes::INVALID_VERSION).count(), 1);
        assert_eq!(diagnostics.with_code(codes::NO_SECTIONS).count(), 1);
    }
}
