// SPDX-License-Identifier: MPL-2.0
//! In-memory document tree.
//!
//! A [`Document`] owns a flat arena of element and text nodes keyed by
//! [`NodeId`]. Ids are monotonic and never reused, so handles held across a
//! removal read as absent rather than pointing at an unrelated node. Every
//! document starts with a permanent `body` element that serves as the
//! attachment root; a node is "attached" when its parent chain reaches the
//! body.
//!
//! Rendering targets share one document behind [`SharedDocument`].

mod markup;
mod node;
pub mod style;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use quick_xml::escape::escape;

use self::node::{ElementData, Node, NodeData};
use crate::error::Result;

pub use self::node::NodeId;

/// A document handle that can be shared between an owner and a driver task.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Flat-arena document tree with a permanent body root.
#[derive(Debug)]
pub struct Document {
    nodes: HashMap<NodeId, Node>,
    body: NodeId,
    next_id: u64,
}

impl Document {
    /// Creates a document containing only the body element.
    pub fn new() -> Self {
        let body = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            body,
            Node {
                parent: None,
                data: NodeData::Element(ElementData::new("body")),
            },
        );
        Self {
            nodes,
            body,
            next_id: 1,
        }
    }

    /// Creates a document already wrapped for sharing.
    pub fn shared() -> SharedDocument {
        Arc::new(Mutex::new(Self::new()))
    }

    /// The permanent attachment root.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of live nodes, body included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Creates a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(tag)))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Parses a markup fragment into detached nodes owned by this document
    /// and returns the top-level ids in source order. On error the document
    /// is left unchanged.
    pub fn parse_fragment(&mut self, markup: &str) -> Result<Vec<NodeId>> {
        markup::parse_fragment(self, markup)
    }

    /// Appends `child` as the last child of `parent`, detaching it from its
    /// current parent first. Appends that would introduce a cycle, target a
    /// text node or involve an unknown id are ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return;
        }
        if self.is_ancestor(child, parent) {
            return;
        }
        if self.element(parent).is_none() {
            return;
        }
        self.detach(child);
        if let Some(element) = self.element_mut(parent) {
            element.children.push(child);
        }
        if let Some(stored) = self.nodes.get_mut(&child) {
            stored.parent = Some(parent);
        }
    }

    /// Detaches `node` from its parent and frees it together with its
    /// entire subtree. The body cannot be removed.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.body {
            return;
        }
        self.detach(node);
        self.free_subtree(node);
    }

    /// Frees all children of `node`, leaving the node itself in place.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = match self.element_mut(node) {
            Some(element) => std::mem::take(&mut element.children),
            None => return,
        };
        for child in children {
            self.free_subtree(child);
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node)?.parent
    }

    /// Child ids of an element, empty for text nodes and unknown ids.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.element(node)
            .map(|element| element.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the parent chain of `node` reaches the body.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.body {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Finds the first attached element in document order whose `id`
    /// attribute equals `id`. Detached nodes are not searched.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_by_id(self.body, id)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.tag.as_str())
    }

    pub fn element_id(&self, node: NodeId) -> Option<&str> {
        self.element(node)?.id.as_deref()
    }

    pub fn set_element_id(&mut self, node: NodeId, id: &str) {
        if let Some(element) = self.element_mut(node) {
            element.id = Some(id.to_string());
        }
    }

    /// Class tokens in insertion order, empty for non-elements.
    pub fn classes(&self, node: NodeId) -> &[String] {
        self.element(node)
            .map(|element| element.classes.as_slice())
            .unwrap_or(&[])
    }

    /// Space-joined class string, as it would appear in markup.
    pub fn class_string(&self, node: NodeId) -> String {
        self.element(node)
            .map(ElementData::class_string)
            .unwrap_or_default()
    }

    /// Adds a class token unless already present.
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            element.add_class(class);
        }
    }

    /// Replaces the class list, deduplicating while keeping first-seen order.
    pub fn set_classes<I, S>(&mut self, node: NodeId, classes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(element) = self.element_mut(node) {
            element.classes.clear();
            for class in classes {
                element.add_class(class.as_ref());
            }
        }
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node)?.styles.get(property).map(String::as_str)
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element
                .styles
                .insert(property.to_string(), value.to_string());
        }
    }

    /// Merges `styles` into the element's inline styles. Existing
    /// properties not named in `styles` are kept.
    pub fn merge_styles(&mut self, node: NodeId, styles: &BTreeMap<String, String>) {
        if let Some(element) = self.element_mut(node) {
            for (property, value) in styles {
                element.styles.insert(property.clone(), value.clone());
            }
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attrs.insert(name.to_string(), value.to_string());
        }
    }

    /// Content of a text node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(&node)?.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    /// Serializes the body subtree. Attributes are written in a fixed
    /// order (`id`, `class`, `style`, then the rest by name) and styles
    /// sorted by property, so equal trees produce equal markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_node(self.body, &mut out);
        out
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node { parent: None, data });
        id
    }

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(&node)?.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(&node)?.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    /// Pre-order search of the subtree rooted at `node`.
    fn find_by_id(&self, node: NodeId, id: &str) -> Option<NodeId> {
        let element = self.element(node)?;
        if element.id.as_deref() == Some(id) {
            return Some(node);
        }
        element
            .children
            .iter()
            .find_map(|&child| self.find_by_id(child, id))
    }

    /// Whether `candidate` appears on the parent chain above `node`.
    fn is_ancestor(&self, candidate: NodeId, mut node: NodeId) -> bool {
        while let Some(parent) = self.parent(node) {
            if parent == candidate {
                return true;
            }
            node = parent;
        }
        false
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(&node).and_then(|stored| stored.parent) else {
            return;
        };
        if let Some(element) = self.element_mut(parent) {
            element.children.retain(|&child| child != node);
        }
        if let Some(stored) = self.nodes.get_mut(&node) {
            stored.parent = None;
        }
    }

    fn free_subtree(&mut self, node: NodeId) {
        let Some(removed) = self.nodes.remove(&node) else {
            return;
        };
        if let NodeData::Element(element) = removed.data {
            for child in element.children {
                self.free_subtree(child);
            }
        }
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        let Some(stored) = self.nodes.get(&node) else {
            return;
        };
        match &stored.data {
            NodeData::Text(text) => out.push_str(&escape(text.as_str())),
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                if let Some(id) = &element.id {
                    write_attr(out, "id", id);
                }
                if !element.classes.is_empty() {
                    write_attr(out, "class", &element.class_string());
                }
                if !element.styles.is_empty() {
                    write_attr(out, "style", &style::to_inline(&element.styles));
                }
                for (name, value) in &element.attrs {
                    write_attr(out, name, value);
                }
                if element.children.is_empty() {
                    out.push_str("/>");
                } else {
                    out.push('>');
                    for &child in &element.children {
                        self.write_node(child, out);
                    }
                    out.push_str("</");
                    out.push_str(&element.tag);
                    out.push('>');
                }
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}
