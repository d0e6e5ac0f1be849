// SPDX-License-Identifier: MPL-2.0
//! Node storage types for the in-memory document tree.

use std::collections::BTreeMap;

/// Unique identifier for a node within one [`Document`](super::Document).
///
/// Ids come from a per-document monotonic counter and are never reused, so a
/// handle kept across a removal reads as absent instead of aliasing a newer
/// node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

/// A stored node: its parent link plus the element or text payload.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) data: NodeData,
}

/// Payload of a node.
#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Element(ElementData),
    Text(String),
}

/// Element payload: tag, identity, classifiers, inline style, children.
///
/// `class` and `style` parsed from markup land in the structured fields;
/// any other attribute is kept verbatim in `attrs`.
#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) styles: BTreeMap<String, String>,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) children: Vec<NodeId>,
}

impl ElementData {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            styles: BTreeMap::new(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Adds a class token unless already present. Classes are a set with
    /// stable insertion order, so repeated adds never duplicate a token.
    pub(crate) fn add_class(&mut self, class: &str) {
        if !self.classes.iter().any(|c| c == class) {
            self.classes.push(class.to_string());
        }
    }

    /// Space-joined class string in insertion order.
    pub(crate) fn class_string(&self) -> String {
        self.classes.join(" ")
    }
}
