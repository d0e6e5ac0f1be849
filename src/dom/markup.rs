// SPDX-License-Identifier: MPL-2.0
//! Markup fragment parsing.
//!
//! Fragments are parsed into detached nodes owned by the target document.
//! `class`, `id` and `style` attributes are routed into the structured
//! element fields; every other attribute is kept verbatim. Predefined
//! entities and numeric character references are resolved in text and
//! attribute values. The input must be well formed: unclosed elements,
//! stray closing tags, malformed attributes and unknown entity names are
//! reported as [`Error::Markup`] and leave the document unchanged.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::dom::{style, Document, NodeId};
use crate::error::{Error, Result};

/// Parses `markup` into nodes inside `document` and returns the top-level
/// node ids in source order. Nothing is attached to the tree; callers
/// decide where the nodes go.
pub(crate) fn parse_fragment(document: &mut Document, markup: &str) -> Result<Vec<NodeId>> {
    let mut created = Vec::new();
    match run(document, markup, &mut created) {
        Ok(()) => Ok(created),
        Err(err) => {
            for &node in &created {
                document.remove(node);
            }
            Err(err)
        }
    }
}

fn run(document: &mut Document, markup: &str, created: &mut Vec<NodeId>) -> Result<()> {
    let mut reader = Reader::from_reader(markup.as_bytes());
    let mut buf = Vec::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut pending_text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                flush_text(document, &mut pending_text, created, &stack);
                let node = element_from_start(document, e)?;
                attach(document, created, &stack, node);
                stack.push(node);
            }
            Ok(Event::Empty(ref e)) => {
                flush_text(document, &mut pending_text, created, &stack);
                let node = element_from_start(document, e)?;
                attach(document, created, &stack, node);
            }
            Ok(Event::End(_)) => {
                flush_text(document, &mut pending_text, created, &stack);
                if stack.pop().is_none() {
                    return Err(Error::Markup("closing tag without an open element".into()));
                }
            }
            Ok(Event::Text(ref t)) => {
                let text = t
                    .unescape()
                    .map_err(|err| Error::Markup(err.to_string()))?;
                pending_text.push_str(&text);
            }
            Ok(Event::CData(ref t)) => {
                pending_text.push_str(&String::from_utf8_lossy(t.as_ref()));
            }
            Ok(Event::Eof) => {
                flush_text(document, &mut pending_text, created, &stack);
                break;
            }
            Ok(_) => {}
            Err(err) => return Err(err.into()),
        }
        buf.clear();
    }

    if stack.is_empty() {
        Ok(())
    } else {
        Err(Error::Markup("unclosed element in fragment".into()))
    }
}

fn element_from_start(document: &mut Document, start: &BytesStart<'_>) -> Result<NodeId> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_string();
    // Collect attributes before allocating, so a malformed attribute cannot
    // leave a half-built node behind.
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| Error::Markup(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::Markup(err.to_string()))?
            .to_string();
        attrs.push((key, value));
    }
    let node = document.create_element(&tag);
    for (key, value) in attrs {
        match key.as_str() {
            "class" => {
                for token in value.split_whitespace() {
                    document.add_class(node, token);
                }
            }
            "id" => document.set_element_id(node, &value),
            "style" => document.merge_styles(node, &style::parse_inline(&value)),
            _ => document.set_attr(node, &key, &value),
        }
    }
    Ok(node)
}

/// Moves accumulated text into a single text node, so text split around
/// comments coalesces instead of fragmenting.
fn flush_text(
    document: &mut Document,
    pending_text: &mut String,
    created: &mut Vec<NodeId>,
    stack: &[NodeId],
) {
    if pending_text.is_empty() {
        return;
    }
    let node = document.create_text(pending_text);
    attach(document, created, stack, node);
    pending_text.clear();
}

fn attach(document: &mut Document, created: &mut Vec<NodeId>, stack: &[NodeId], node: NodeId) {
    if let Some(&parent) = stack.last() {
        document.append_child(parent, node);
    } else {
        created.push(node);
    }
}
