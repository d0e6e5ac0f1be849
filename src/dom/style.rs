// SPDX-License-Identifier: MPL-2.0
//! Inline style parsing and serialization.
//!
//! Inline styles live on elements as a property map ordered by property
//! name, so serialized markup is deterministic regardless of the order in
//! which properties were set.

use std::collections::BTreeMap;

/// Parses an inline style string such as `"color: red; padding: 4px"` into
/// a property map. Empty declarations and declarations without a `:` are
/// skipped; surrounding whitespace is trimmed from both sides.
pub fn parse_inline(source: &str) -> BTreeMap<String, String> {
    let mut styles = BTreeMap::new();
    for declaration in source.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let property = property.trim();
        let value = value.trim();
        if property.is_empty() || value.is_empty() {
            continue;
        }
        styles.insert(property.to_string(), value.to_string());
    }
    styles
}

/// Serializes a property map back to `"a: 1; b: 2"` form, ordered by
/// property name.
pub fn to_inline(styles: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (property, value) in styles {
        if !out.is_empty() {
            out.push_str("; ");
        }
        out.push_str(property);
        out.push_str(": ");
        out.push_str(value);
    }
    out
}
