//! HTML escaping for free text accepted at the save boundary.
//!
//! Stored text ends up inside preview markup (meta tags, SVG text), so every
//! user-supplied string is escaped once, before it reaches the store.

use crate::model::CardPatch;
use serde_json::{Map, Value};

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

const ENTITIES: &[(&str, char)] = &[
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&#x27;", '\''),
];

/// Inverse of [`escape_html`]. Single pass, so `&amp;lt;` yields `&lt;`.
pub fn unescape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match ENTITIES.iter().find(|(entity, _)| tail.starts_with(entity)) {
            Some((entity, c)) => {
                out.push(*c);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escapes every string nested anywhere inside `value`. Object keys are kept.
pub fn escape_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_html(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(escape_value).collect()),
        Value::Object(map) => Value::Object(escape_map(map)),
        other => other,
    }
}

fn escape_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (k, escape_value(v))).collect()
}

/// Escapes the free-text parts of a patch. Identity fields are compared
/// verbatim by the access policy and are left untouched.
pub fn sanitize_patch(mut patch: CardPatch) -> CardPatch {
    patch.greeting_text = patch.greeting_text.map(|t| escape_html(&t));
    patch.tags = patch
        .tags
        .map(|tags| tags.iter().map(|t| escape_html(t)).collect());
    patch.meta = patch.meta.map(escape_map);
    patch.extra = escape_map(patch.extra);
    patch
}
