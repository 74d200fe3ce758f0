//! Namespace-aware navigation over a parsed markup tree
//!
//! Every extractor queries the tree through [`Navigator`] instead of walking raw nodes, so
//! element matching is done on (namespace URI, local name) and is independent of the prefix
//! a given document revision happens to use.

use crate::domain::{Result, SplError};
use roxmltree::{Node, NodeId, ParsingOptions};
use std::collections::BTreeMap;

/// HL7 version 3 namespace used by SPL documents
pub const HL7_NS: &str = "urn:hl7-org:v3";

/// XML Schema instance namespace (`xsi:type`)
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A namespace-qualified name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QName<'n> {
    pub namespace: Option<&'n str>,
    pub local: &'n str,
}

impl<'n> QName<'n> {
    /// Name in the HL7 v3 namespace
    pub const fn hl7(local: &'n str) -> Self {
        Self {
            namespace: Some(HL7_NS),
            local,
        }
    }

    /// Name in the XML Schema instance namespace
    pub const fn xsi(local: &'n str) -> Self {
        Self {
            namespace: Some(XSI_NS),
            local,
        }
    }

    /// Name without a namespace
    pub const fn unqualified(local: &'n str) -> Self {
        Self {
            namespace: None,
            local,
        }
    }
}

impl std::fmt::Display for QName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => f.write_str(self.local),
        }
    }
}

/// Prefix to URI bindings declared anywhere in a document
///
/// The default namespace is stored under the empty prefix. A prefix rebound to a different
/// URI in a nested scope keeps every URI it was bound to, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceTable {
    bindings: BTreeMap<String, Vec<String>>,
}

impl NamespaceTable {
    fn collect(doc: &roxmltree::Document<'_>) -> Self {
        let mut bindings: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for node in doc.descendants().filter(|n| n.is_element()) {
            for ns in node.namespaces() {
                let uris = bindings
                    .entry(ns.name().unwrap_or_default().to_string())
                    .or_default();
                if !uris.iter().any(|u| u == ns.uri()) {
                    uris.push(ns.uri().to_string());
                }
            }
        }
        Self { bindings }
    }

    /// First URI bound to a prefix (`""` for the default namespace)
    pub fn uri_for(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .get(prefix)
            .and_then(|uris| uris.first())
            .map(String::as_str)
    }

    /// Every prefix bound to the URI
    pub fn prefixes_for(&self, uri: &str) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|(_, uris)| uris.iter().any(|u| u == uri))
            .map(|(prefix, _)| prefix.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Decodes raw bytes into markup text
///
/// Strips a UTF-8 byte order mark. Invalid UTF-8 is reported as malformed markup with the
/// byte offset of the first invalid sequence.
pub fn decode(bytes: &[u8]) -> Result<&str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|e| {
        let offset = e.valid_up_to();
        let (line, column) = line_column(bytes, offset);
        SplError::MalformedMarkup {
            message: format!("invalid UTF-8 at byte offset {offset}"),
            line,
            column,
        }
    })
}

/// Deepest element nesting [`Navigator::parse`] accepts
pub const MAX_ELEMENT_DEPTH: usize = 256;

fn line_column(bytes: &[u8], offset: usize) -> (u32, u32) {
    let prefix = &bytes[..offset.min(bytes.len())];
    let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = prefix.len() - prefix.iter().rposition(|&b| b == b'\n').map_or(0, |p| p + 1) + 1;
    (
        u32::try_from(line).unwrap_or(u32::MAX),
        u32::try_from(column).unwrap_or(u32::MAX),
    )
}

/// Rejects markup whose elements nest deeper than `limit`
///
/// Runs over the raw tags without building a tree. Comments, CDATA sections, processing
/// instructions and declarations are skipped. Other syntax errors are left for the parser.
fn check_depth(text: &str, limit: usize) -> Result<()> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while let Some(found) = bytes[i..].iter().position(|&b| b == b'<') {
        let start = i + found;
        let rest = &bytes[start..];
        i = if rest.starts_with(b"<!--") {
            skip_past(bytes, start + 4, b"-->")
        } else if rest.starts_with(b"<![CDATA[") {
            skip_past(bytes, start + 9, b"]]>")
        } else if rest.starts_with(b"<?") {
            skip_past(bytes, start + 2, b"?>")
        } else if rest.starts_with(b"<!") {
            declaration_end(bytes, start + 2)
        } else if rest.starts_with(b"</") {
            depth = depth.saturating_sub(1);
            skip_past(bytes, start + 2, b">")
        } else {
            let end = tag_end(bytes, start + 1);
            if bytes[..end].ends_with(b"/>") {
                end
            } else {
                depth += 1;
                if depth > limit {
                    let (line, column) = line_column(bytes, start);
                    return Err(SplError::MalformedMarkup {
                        message: format!("elements nested deeper than {limit} levels"),
                        line,
                        column,
                    });
                }
                end
            }
        };
    }
    Ok(())
}

fn skip_past(bytes: &[u8], from: usize, terminator: &[u8]) -> usize {
    bytes[from..]
        .windows(terminator.len())
        .position(|w| w == terminator)
        .map_or(bytes.len(), |p| from + p + terminator.len())
}

/// Index just past the `>` closing a start tag, ignoring `>` inside attribute values
fn tag_end(bytes: &[u8], from: usize) -> usize {
    let mut quote = None;
    for (offset, &b) in bytes[from..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return from + offset + 1,
            None => {}
        }
    }
    bytes.len()
}

/// Index just past a `<!DOCTYPE ...>` style declaration, including any internal subset
fn declaration_end(bytes: &[u8], from: usize) -> usize {
    let mut quote = None;
    let mut brackets = 0usize;
    for (offset, &b) in bytes[from..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => brackets += 1,
                b']' => brackets = brackets.saturating_sub(1),
                b'>' if brackets == 0 => return from + offset + 1,
                _ => {}
            },
        }
    }
    bytes.len()
}

/// Read-only, namespace-aware view over one parsed document
pub struct Navigator<'input> {
    doc: roxmltree::Document<'input>,
    namespaces: NamespaceTable,
}

impl<'input> Navigator<'input> {
    /// Parses markup text into a navigable tree
    ///
    /// # Errors
    ///
    /// Returns [`SplError::MalformedMarkup`] with the line and column of the problem when
    /// the input is not well-formed or nests elements deeper than [`MAX_ELEMENT_DEPTH`].
    pub fn parse(text: &'input str) -> Result<Self> {
        check_depth(text, MAX_ELEMENT_DEPTH)?;
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, options)?;
        let namespaces = NamespaceTable::collect(&doc);
        Ok(Self { doc, namespaces })
    }

    /// The document element
    pub fn root(&self) -> Node<'_, 'input> {
        self.doc.root_element()
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// Looks a node up by its arena id
    pub fn node(&self, id: NodeId) -> Option<Node<'_, 'input>> {
        self.doc.get_node(id)
    }

    /// Resolves a `prefix:local` name against the prefixes in scope at `node`
    ///
    /// An unprefixed name resolves to the default namespace in scope, if any.
    pub fn resolve<'a>(&self, node: Node<'a, 'input>, prefixed: &'a str) -> Option<QName<'a>> {
        let (prefix, local) = match prefixed.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, prefixed),
        };
        let namespace = node.lookup_namespace_uri(prefix);
        if prefix.is_some() && namespace.is_none() {
            return None;
        }
        Some(QName { namespace, local })
    }

    /// Line and column of a node's start
    pub fn position(&self, node: Node<'_, 'input>) -> (u32, u32) {
        let pos = self.doc.text_pos_at(node.range().start);
        (pos.row, pos.col)
    }
}

/// Whether `node` is an element named `name`
///
/// HL7 names also match elements with no namespace at all, which happens when a producer
/// drops the default namespace declaration.
pub fn is_named(node: Node<'_, '_>, name: QName<'_>) -> bool {
    if !node.is_element() || node.tag_name().name() != name.local {
        return false;
    }
    let ns = node.tag_name().namespace();
    ns == name.namespace || (name.namespace == Some(HL7_NS) && ns.is_none())
}

/// First child element named `name`
pub fn child<'a, 'input>(node: Node<'a, 'input>, name: QName<'_>) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_named(*c, name))
}

/// All child elements named `name`, in source order
pub fn children<'a, 'input: 'a, 'n: 'a>(
    node: Node<'a, 'input>,
    name: QName<'n>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |c| is_named(*c, name))
}

/// All descendant elements named `name` (excluding `node` itself), in document order
pub fn descendants<'a, 'input: 'a, 'n: 'a>(
    node: Node<'a, 'input>,
    name: QName<'n>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.descendants()
        .skip(1)
        .filter(move |c| is_named(*c, name))
}

/// Follows a chain of child names, taking the first match at each step
pub fn path<'a, 'input>(node: Node<'a, 'input>, steps: &[QName<'_>]) -> Option<Node<'a, 'input>> {
    steps.iter().try_fold(node, |current, step| child(current, *step))
}

/// Follows a chain of child names, fanning out over every match at each step
pub fn path_all<'a, 'input>(node: Node<'a, 'input>, steps: &[QName<'_>]) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];
    for step in steps {
        current = current
            .into_iter()
            .flat_map(|n| n.children().filter(|c| is_named(*c, *step)))
            .collect();
    }
    current
}

/// Unqualified attribute value, trimmed, `None` when absent or blank
pub fn attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name).map(str::trim).filter(|v| !v.is_empty())
}

/// Namespace-qualified attribute value, trimmed, `None` when absent or blank
pub fn attr_ns<'a>(node: Node<'a, '_>, name: QName<'_>) -> Option<&'a str> {
    let value = match name.namespace {
        Some(ns) => node.attribute((ns, name.local)),
        None => node.attribute(name.local),
    };
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `xsi:type` of an element with any prefix removed (`"v3:CE"` becomes `"CE"`)
pub fn xsi_type<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    attr_ns(node, QName::xsi("type")).map(|t| t.rsplit(':').next().unwrap_or(t))
}

/// All descendant text joined with whitespace collapsed, `None` when empty
pub fn text(node: Node<'_, '_>) -> Option<String> {
    let joined = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}

/// Text of the node's own text children only, skipping nested elements
pub fn own_text(node: Node<'_, '_>) -> Option<String> {
    let joined = node
        .children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}

/// Collapses whitespace runs to single spaces, `None` when nothing remains
pub fn collapse_whitespace(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIXED: &str = r#"<v3:document xmlns:v3="urn:hl7-org:v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <v3:id root="abc"/>
  <v3:component><v3:section><v3:title>One</v3:title></v3:section></v3:component>
  <v3:component><v3:section><v3:title>Two</v3:title></v3:section></v3:component>
  <v3:value xsi:type="v3:CE" code="C48325"/>
</v3:document>"#;

    const DEFAULT_NS: &str = r#"<document xmlns="urn:hl7-org:v3">
  <id root="abc"/>
  <component><section><title>One</title></section></component>
  <component><section><title>  Two
     lines </title></section></component>
</document>"#;

    #[test]
    fn test_prefix_variation_matches_same_names() {
        for xml in [PREFIXED, DEFAULT_NS] {
            let nav = Navigator::parse(xml).unwrap();
            let root = nav.root();
            assert!(is_named(root, QName::hl7("document")));
            assert_eq!(attr(child(root, QName::hl7("id")).unwrap(), "root"), Some("abc"));

            let titles: Vec<_> = path_all(
                root,
                &[QName::hl7("component"), QName::hl7("section"), QName::hl7("title")],
            )
            .into_iter()
            .filter_map(text)
            .collect();
            assert_eq!(titles.len(), 2);
            assert_eq!(titles[0], "One");
        }
    }

    #[test]
    fn test_whitespace_collapsed_in_text() {
        let nav = Navigator::parse(DEFAULT_NS).unwrap();
        let title = descendants(nav.root(), QName::hl7("title")).nth(1).unwrap();
        assert_eq!(text(title).as_deref(), Some("Two lines"));
    }

    #[test]
    fn test_unnamespaced_document_matches_hl7_names() {
        let nav = Navigator::parse("<document><id root='x'/></document>").unwrap();
        assert!(is_named(nav.root(), QName::hl7("document")));
        assert!(child(nav.root(), QName::hl7("id")).is_some());
    }

    #[test]
    fn test_foreign_namespace_does_not_match() {
        let nav = Navigator::parse(r#"<document xmlns="urn:other"><id/></document>"#).unwrap();
        assert!(!is_named(nav.root(), QName::hl7("document")));
    }

    #[test]
    fn test_xsi_type_strips_prefix() {
        let nav = Navigator::parse(PREFIXED).unwrap();
        let value = child(nav.root(), QName::hl7("value")).unwrap();
        assert_eq!(xsi_type(value), Some("CE"));
    }

    #[test]
    fn test_namespace_table() {
        let nav = Navigator::parse(PREFIXED).unwrap();
        let table = nav.namespaces();
        assert_eq!(table.uri_for("v3"), Some(HL7_NS));
        assert_eq!(table.uri_for("xsi"), Some(XSI_NS));
        assert_eq!(table.prefixes_for(HL7_NS), vec!["v3"]);
        assert!(table.uri_for("").is_none());
    }

    #[test]
    fn test_resolve_prefixed_name() {
        let nav = Navigator::parse(PREFIXED).unwrap();
        let root = nav.root();
        assert_eq!(nav.resolve(root, "v3:section"), Some(QName::hl7("section")));
        assert_eq!(nav.resolve(root, "nope:section"), None);
        assert_eq!(nav.resolve(root, "section"), Some(QName::unqualified("section")));
    }

    #[test]
    fn test_malformed_markup_reports_position() {
        let err = Navigator::parse("<document>\n  <section>\n</document>").err().unwrap();
        match err {
            SplError::MalformedMarkup { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_strips_bom_and_rejects_invalid_utf8() {
        assert_eq!(decode(b"\xEF\xBB\xBF<a/>").unwrap(), "<a/>");

        let err = decode(b"<a>\n\xFF</a>").unwrap_err();
        match err {
            SplError::MalformedMarkup { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn nested(depth: usize) -> String {
        format!("{}{}", "<section>".repeat(depth), "</section>".repeat(depth))
    }

    #[test]
    fn test_nesting_at_limit_parses() {
        assert!(Navigator::parse(&nested(MAX_ELEMENT_DEPTH)).is_ok());
    }

    #[test]
    fn test_deep_nesting_is_malformed() {
        let xml = format!("<document>\n{}</document>", nested(3000));
        match Navigator::parse(&xml).err().unwrap() {
            SplError::MalformedMarkup { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("nested deeper"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_depth_scan_skips_non_elements() {
        let noise = r#"<!-- <a><b> --><![CDATA[<c><d>]]><?pi <e>?><leaf attr="x>y"/>"#;
        let xml = format!(
            "<!DOCTYPE document [<!ENTITY x \"<f>\">]>\n<document>{}{noise}</document>",
            nested(MAX_ELEMENT_DEPTH - 1)
        );
        assert!(check_depth(&xml, MAX_ELEMENT_DEPTH).is_ok());
        assert!(check_depth(&xml, MAX_ELEMENT_DEPTH - 1).is_err());
    }

    #[test]
    fn test_path_takes_first_match() {
        let nav = Navigator::parse(DEFAULT_NS).unwrap();
        let title = path(
            nav.root(),
            &[QName::hl7("component"), QName::hl7("section"), QName::hl7("title")],
        )
        .unwrap();
        assert_eq!(own_text(title).as_deref(), Some("One"));
        assert!(path(nav.root(), &[QName::hl7("missing")]).is_none());
    }

    #[test]
    fn test_position() {
        let nav = Navigator::parse(DEFAULT_NS).unwrap();
        let id = child(nav.root(), QName::hl7("id")).unwrap();
        assert_eq!(nav.position(id), (2, 3));
        assert!(nav.node(id.id()).is_some());
    }
}
