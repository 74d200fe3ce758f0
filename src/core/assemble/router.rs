//! Section router
//!
//! Sections are first collected into a flat arena with explicit child links, then walked
//! depth-first to build the owned [`Section`] tree. A section element that carries a
//! `referencedObject` attribute stands for the section whose `ID` matches, which is the only
//! way the markup can express a cycle. The walk keeps the arena indices of the current path;
//! a link back onto the path drops that subtree with a `CYCLIC_SECTION` error and the walk
//! continues with its siblings.
//!
//! References can also fan out without forming a cycle, so the walk is bounded twice: the
//! nesting depth is capped at [`MAX_SECTION_DEPTH`] and the number of sections built is capped
//! at [`EXPANSION_FACTOR`] times the number of section elements. Hitting either bound drops the
//! remaining subtrees and records one `SECTION_EXPANSION_LIMIT` error.

use crate::core::extract::{coded_value, extract_clinical, extract_product, ExtractContext};
use crate::domain::diagnostics::codes;
use crate::domain::{Diagnostic, Section, SectionKind, SectionType, Severity, SplError};
use crate::markup::navigator::{attr, child, children, path, text};
use crate::markup::QName;
use roxmltree::Node;
use std::collections::{HashMap, HashSet};

/// Extractor a section is dispatched to, resolved from its LOINC code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// Product data elements: products plus narrative
    Product,
    /// Known clinical section: narrative only
    Clinical,
    /// Code absent or not in the table: raw title and narrative kept
    Unclassified,
}

impl Extractor {
    pub fn for_code(code: Option<&str>) -> Self {
        match code.and_then(SectionType::from_loinc) {
            Some(section_type) if section_type.is_product_listing() => Self::Product,
            Some(_) => Self::Clinical,
            None => Self::Unclassified,
        }
    }
}

/// Deepest section nesting the walk descends into
pub const MAX_SECTION_DEPTH: usize = 64;

/// Sections built per section element before expansion stops
pub const EXPANSION_FACTOR: usize = 4;

#[derive(Debug, Clone)]
enum Link {
    Inline(usize),
    Reference(String),
}

struct Entry<'a, 'input> {
    node: Node<'a, 'input>,
    children: Vec<Link>,
}

/// Flat arena of section elements
struct SectionArena<'a, 'input> {
    entries: Vec<Entry<'a, 'input>>,
    by_xml_id: HashMap<&'a str, usize>,
    roots: Vec<Link>,
}

impl<'a, 'input> SectionArena<'a, 'input> {
    fn build(body: Node<'a, 'input>) -> Self {
        let mut arena = Self {
            entries: Vec::new(),
            by_xml_id: HashMap::new(),
            roots: Vec::new(),
        };

        let mut pending = Vec::new();
        for section in child_sections(body) {
            let link = arena.link(section, &mut pending);
            arena.roots.push(link);
        }
        while let Some(index) = pending.pop() {
            let node = arena.entries[index].node;
            for section in child_sections(node) {
                let link = arena.link(section, &mut pending);
                arena.entries[index].children.push(link);
            }
        }
        arena
    }

    fn link(&mut self, section: Node<'a, 'input>, pending: &mut Vec<usize>) -> Link {
        if let Some(target) = attr(section, "referencedObject") {
            return Link::Reference(target.to_string());
        }
        let index = self.entries.len();
        self.entries.push(Entry {
            node: section,
            children: Vec::new(),
        });
        if let Some(xml_id) = attr(section, "ID") {
            self.by_xml_id.entry(xml_id).or_insert(index);
        }
        pending.push(index);
        Link::Inline(index)
    }

    fn resolve(&self, link: &Link) -> Option<usize> {
        match link {
            Link::Inline(index) => Some(*index),
            Link::Reference(target) => self.by_xml_id.get(target.as_str()).copied(),
        }
    }
}

/// `component/section` children of a body or section element, in source order
fn child_sections<'a, 'input>(node: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    children(node, QName::hl7("component"))
        .filter_map(|c| child(c, QName::hl7("section")))
        .collect()
}

/// Routes the sections of a document's structured body
///
/// Returns the top-level sections in source order. Every problem found on the way is
/// recorded in `ctx.diagnostics`.
pub fn route_sections(document: Node<'_, '_>, ctx: &mut ExtractContext) -> Vec<Section> {
    let Some(body) = path(
        document,
        &[QName::hl7("component"), QName::hl7("structuredBody")],
    ) else {
        return Vec::new();
    };

    let arena = SectionArena::build(body);
    let mut walker = Walker {
        arena: &arena,
        on_path: HashSet::new(),
        budget: arena.entries.len().saturating_mul(EXPANSION_FACTOR),
        limit_reported: false,
        ctx,
    };

    let mut sections = Vec::with_capacity(arena.roots.len());
    for link in &arena.roots {
        let field_path = format!("sections[{}]", sections.len());
        if let Some(section) = walker.walk(link, field_path, sections.len()) {
            sections.push(section);
        }
    }
    sections
}

struct Walker<'r, 'a, 'input, 'c> {
    arena: &'r SectionArena<'a, 'input>,
    on_path: HashSet<usize>,
    budget: usize,
    limit_reported: bool,
    ctx: &'c mut ExtractContext,
}

impl Walker<'_, '_, '_, '_> {
    fn walk(&mut self, link: &Link, field_path: String, index: usize) -> Option<Section> {
        let Some(entry_index) = self.arena.resolve(link) else {
            if let Link::Reference(target) = link {
                let err = SplError::UnresolvedReference {
                    field_path: field_path.clone(),
                    reference: target.clone(),
                };
                self.ctx.diagnostics.push(Diagnostic::from_error(
                    Severity::Warning,
                    codes::SECTION_REFERENCE_UNRESOLVED,
                    &err,
                ));
            }
            return None;
        };

        if self.on_path.contains(&entry_index) {
            tracing::debug!(field_path = %field_path, "Dropping cyclic section reference");
            let err = SplError::CyclicStructure {
                field_path: field_path.clone(),
            };
            self.ctx.diagnostics.push(Diagnostic::from_error(
                Severity::Error,
                codes::CYCLIC_SECTION,
                &err,
            ));
            return None;
        }

        if self.on_path.len() >= MAX_SECTION_DEPTH || self.budget == 0 {
            self.report_limit(&field_path);
            return None;
        }
        self.budget -= 1;

        self.on_path.insert(entry_index);
        let arena = self.arena;
        let entry = &arena.entries[entry_index];
        let mut section = self.extract(entry.node, &field_path, index);

        for child_link in &entry.children {
            let child_index = section.children.len();
            let child_path = format!("{field_path}.children[{child_index}]");
            if let Some(child) = self.walk(child_link, child_path, child_index) {
                section.children.push(child);
            }
        }

        self.on_path.remove(&entry_index);
        Some(section)
    }

    fn report_limit(&mut self, field_path: &str) {
        if self.limit_reported {
            return;
        }
        self.limit_reported = true;
        tracing::debug!(field_path = %field_path, "Section expansion limit reached");
        self.ctx.diagnostics.push(Diagnostic::error(
            codes::SECTION_EXPANSION_LIMIT,
            field_path,
            format!(
                "section references expand past {MAX_SECTION_DEPTH} levels or \
                 {EXPANSION_FACTOR}x the section count; remaining subtrees dropped"
            ),
        ));
    }

    fn extract(&mut self, node: Node<'_, '_>, field_path: &str, index: usize) -> Section {
        let code = child(node, QName::hl7("code")).and_then(coded_value);
        let extractor = Extractor::for_code(code.as_ref().map(|c| c.code.as_str()));

        let clinical = extract_clinical(node, field_path, self.ctx);

        if extractor == Extractor::Unclassified {
            let message = match &clinical.kind {
                SectionKind::Unclassified {
                    raw_code: Some(raw),
                } => format!("LOINC code '{raw}' is not a known section type; kept unclassified"),
                _ => "section has no code; kept unclassified".to_string(),
            };
            self.ctx.diagnostics.push(Diagnostic::info(
                codes::LOINC_CODE_UNKNOWN,
                field_path,
                message,
            ));
        }

        let mut products = Vec::new();
        if extractor == Extractor::Product {
            let listed = children(node, QName::hl7("subject"))
                .filter_map(|s| child(s, QName::hl7("manufacturedProduct")));
            for outer in listed {
                let product_path = format!("{field_path}.products[{}]", products.len());
                match extract_product(outer, &product_path, self.ctx) {
                    Ok(product) => products.push(product),
                    Err(errors) => {
                        for err in &errors {
                            self.ctx.diagnostics.push(Diagnostic::from_error(
                                Severity::Error,
                                codes::MISSING_REQUIRED_FIELD,
                                err,
                            ));
                        }
                    }
                }
            }
        }

        Section {
            id: child(node, QName::hl7("id"))
                .and_then(|i| attr(i, "root"))
                .map(str::to_string),
            xml_id: attr(node, "ID").map(str::to_string),
            code,
            kind: clinical.kind,
            title: child(node, QName::hl7("title")).and_then(text),
            index,
            effective_time: child(node, QName::hl7("effectiveTime"))
                .and_then(|e| attr(e, "value"))
                .map(str::to_string),
            text: clinical.text,
            products,
            media: clinical.media,
            children: Vec::new(),
        }
    }
}
