//! Narrative block to plain text
//!
//! Strips structural markup while keeping block boundaries readable:
//!
//! - `br` ends the current line
//! - `paragraph`, `list` and `table` are separated from their surroundings by a blank line
//! - list items become `• ` bullets (`1. `, `2. `, ... for ordered lists), one per line
//! - table rows become lines with cells separated by tabs
//! - `renderMultiMedia` produces no text; its target id is collected instead
//!
//! Only HL7 elements carry block meaning; elements from other namespaces are treated as
//! inline containers. The transform is one-way. Entities are already decoded by the parser.

use crate::markup::navigator::{attr, is_named};
use crate::markup::QName;
use roxmltree::Node;

/// Plain text and media references of a narrative block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Narrative {
    pub text: Option<String>,
    /// `referencedObject` ids of `renderMultiMedia` elements, in document order
    pub media_ids: Vec<String>,
}

/// Renders a section `text` element
pub fn render(text_node: Node<'_, '_>) -> Narrative {
    let mut writer = Writer::default();
    writer.children(text_node);
    Narrative {
        text: finish(&writer.out),
        media_ids: writer.media_ids,
    }
}

#[derive(Default)]
struct Writer {
    out: String,
    media_ids: Vec<String>,
}

impl Writer {
    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn trim_trailing_spaces(&mut self) {
        let kept = self.out.trim_end_matches(' ').len();
        self.out.truncate(kept);
    }

    fn inline(&mut self, raw: &str) {
        let words: Vec<&str> = raw.split_whitespace().collect();
        if words.is_empty() {
            if !raw.is_empty() && !self.at_line_start() && !self.out.ends_with([' ', '\t']) {
                self.out.push(' ');
            }
            return;
        }
        if raw.starts_with(char::is_whitespace)
            && !self.at_line_start()
            && !self.out.ends_with([' ', '\t'])
        {
            self.out.push(' ');
        }
        self.out.push_str(&words.join(" "));
        if raw.ends_with(char::is_whitespace) {
            self.out.push(' ');
        }
    }

    fn line_break(&mut self) {
        self.trim_trailing_spaces();
        self.out.push('\n');
    }

    fn block_break(&mut self) {
        self.trim_trailing_spaces();
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }

    fn children(&mut self, node: Node<'_, '_>) {
        for child in node.children() {
            self.node(child);
        }
    }

    fn node(&mut self, node: Node<'_, '_>) {
        if node.is_text() {
            if let Some(text) = node.text() {
                self.inline(text);
            }
            return;
        }
        if !node.is_element() {
            return;
        }

        let named = |local| is_named(node, QName::hl7(local));
        if named("br") {
            self.line_break();
        } else if named("paragraph") {
            self.block_break();
            self.children(node);
            self.block_break();
        } else if named("list") {
            self.list(node);
        } else if named("table") {
            self.table(node);
        } else if named("renderMultiMedia") {
            if let Some(id) = attr(node, "referencedObject") {
                self.media_ids.push(id.to_string());
            }
        } else if !named("footnoteRef") {
            self.children(node);
        }
    }

    fn list(&mut self, list: Node<'_, '_>) {
        let ordered = attr(list, "listType").is_some_and(|t| t.eq_ignore_ascii_case("ordered"));
        self.block_break();
        if let Some(caption) = list.children().find(|c| is_named(*c, QName::hl7("caption"))) {
            self.children(caption);
            self.line_break();
        }
        let items = list
            .children()
            .filter(|c| is_named(*c, QName::hl7("item")));
        for (i, item) in items.enumerate() {
            if !self.at_line_start() {
                self.line_break();
            }
            if ordered {
                self.out.push_str(&format!("{}. ", i + 1));
            } else {
                self.out.push_str("• ");
            }
            self.children(item);
            self.trim_trailing_spaces();
        }
        self.block_break();
    }

    fn table(&mut self, table: Node<'_, '_>) {
        self.block_break();
        if let Some(caption) = table.children().find(|c| is_named(*c, QName::hl7("caption"))) {
            self.children(caption);
            self.line_break();
        }
        for row in table_rows(table) {
            let cells: Vec<String> = row
                .children()
                .filter(|c| is_named(*c, QName::hl7("td")) || is_named(*c, QName::hl7("th")))
                .map(|cell| {
                    let mut inner = Writer::default();
                    inner.children(cell);
                    self.media_ids.append(&mut inner.media_ids);
                    inner.out.split_whitespace().collect::<Vec<_>>().join(" ")
                })
                .collect();
            if cells.iter().all(String::is_empty) {
                continue;
            }
            if !self.at_line_start() {
                self.line_break();
            }
            self.out.push_str(&cells.join("\t"));
            self.out.push('\n');
        }
        self.block_break();
    }
}

/// Rows of `table` in header, body, footer order, excluding rows of nested tables
fn table_rows<'a, 'input>(table: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    let mut rows = Vec::new();
    for group in ["thead", "tbody", "tfoot"] {
        for part in table.children().filter(|c| is_named(*c, QName::hl7(group))) {
            rows.extend(part.children().filter(|c| is_named(*c, QName::hl7("tr"))));
        }
    }
    rows.extend(table.children().filter(|c| is_named(*c, QName::hl7("tr"))));
    rows
}

/// Trims every line and keeps at most one blank line between blocks
fn finish(raw: &str) -> Option<String> {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines() {
        let line = line.trim_matches(' ');
        if line.trim().is_empty() {
            if lines.last().is_some_and(|last| !last.is_empty()) {
                lines.push("");
            }
        } else {
            lines.push(line);
        }
    }
    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
