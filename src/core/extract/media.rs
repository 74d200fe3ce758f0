//! Document-wide index of `observationMedia` objects
//!
//! Narrative text refers to media through `renderMultiMedia/@referencedObject`; the targets
//! live in `observationMedia` components that may sit anywhere in the document. The index is
//! built once per document and tracks which entries were referenced so the leftovers can be
//! attached to the document itself.

use crate::domain::MediaReference;
use crate::markup::navigator::{attr, child, descendants, text};
use crate::markup::QName;
use roxmltree::Node;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct MediaIndex {
    entries: Vec<MediaReference>,
    by_id: HashMap<String, usize>,
    used: HashSet<usize>,
}

impl MediaIndex {
    /// Collects every `observationMedia` below `root` that carries an `ID`
    ///
    /// The first object wins when an `ID` is declared twice.
    pub fn build(root: Node<'_, '_>) -> Self {
        let mut index = Self::default();
        for media in descendants(root, QName::hl7("observationMedia")) {
            let Some(id) = attr(media, "ID") else {
                continue;
            };
            if index.by_id.contains_key(id) {
                continue;
            }
            let value = child(media, QName::hl7("value"));
            let entry = MediaReference {
                id: id.to_string(),
                media_type: value.and_then(|v| attr(v, "mediaType")).map(str::to_string),
                reference: value
                    .and_then(|v| child(v, QName::hl7("reference")))
                    .and_then(|r| attr(r, "value"))
                    .map(str::to_string),
                description: child(media, QName::hl7("text")).and_then(text),
            };
            index.by_id.insert(entry.id.clone(), index.entries.len());
            index.entries.push(entry);
        }
        index
    }

    /// Looks a media object up by `ID` and marks it as referenced
    pub fn resolve(&mut self, id: &str) -> Option<MediaReference> {
        let position = *self.by_id.get(id.trim())?;
        self.used.insert(position);
        Some(self.entries[position].clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Media never referenced from a section, in document order
    pub fn unreferenced(&self) -> Vec<MediaReference> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.used.contains(i))
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}
