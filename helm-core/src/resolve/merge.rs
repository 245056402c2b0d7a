//! Merge rules used during resolution.
//!
//! Two distinct merges happen in a pass:
//!
//! 1. Same-entry candidates sharing a dedupe key merge their structured
//!    payloads (object union, array concatenation, later fields overriding
//!    earlier ones) instead of replacing each other. This is what lets
//!    several JSON-LD fragments accumulate into one script tag.
//!
//! 2. Attribute bags (`htmlAttrs`, `bodyAttrs`) merge per-attribute across
//!    entries: later entries override same-named attributes, non-conflicting
//!    attributes union. `class` and `style` accumulate instead of replacing.

use serde_json::Value;

use crate::store::input::TagProps;

/// Deep-merge `from` into `into`.
///
/// Objects union recursively with `from` winning per key; arrays
/// concatenate; any other pairing is replaced by `from`.
pub fn deep_merge(into: &mut Value, from: &Value) {
    match (into, from) {
        (Value::Object(a), Value::Object(b)) => {
            for (k, v) in b {
                match a.get_mut(k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        a.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.extend(b.iter().cloned());
        }
        (into, from) => {
            *into = from.clone();
        }
    }
}

/// Merge a later candidate's props into an earlier one's, key by key.
pub fn merge_props(into: &mut TagProps, from: &TagProps) {
    for (k, v) in from {
        match into.get_mut(k) {
            Some(existing) => deep_merge(existing, v),
            None => {
                into.insert(k.clone(), v.clone());
            }
        }
    }
}

/// Merge a later entry's attribute bag into the accumulated bag.
///
/// `class` merges as a space-separated token set preserving first-seen
/// order; `style` concatenates declarations; everything else is
/// last-write-wins.
pub fn merge_attr_bag(into: &mut TagProps, from: &TagProps) {
    for (k, v) in from {
        match k.as_str() {
            "class" => {
                let merged = merge_class(
                    into.get(k).and_then(Value::as_str).unwrap_or(""),
                    v.as_str().unwrap_or(""),
                );
                into.insert(k.clone(), Value::String(merged));
            }
            "style" => {
                let merged = merge_style(
                    into.get(k).and_then(Value::as_str).unwrap_or(""),
                    v.as_str().unwrap_or(""),
                );
                into.insert(k.clone(), Value::String(merged));
            }
            _ => {
                into.insert(k.clone(), v.clone());
            }
        }
    }
}

fn merge_class(existing: &str, incoming: &str) -> String {
    let mut tokens: Vec<&str> = existing.split_whitespace().collect();
    for token in incoming.split_whitespace() {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens.join(" ")
}

fn merge_style(existing: &str, incoming: &str) -> String {
    let mut parts: Vec<&str> = existing
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    for part in incoming.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        if !parts.contains(&part) {
            parts.push(part);
        }
    }
    parts.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::input::props;
    use serde_json::json;

    #[test]
    fn objects_union_with_later_winning() {
        let mut a = json!({"x": 1, "nested": {"keep": true, "replace": "old"}});
        let b = json!({"y": 2, "nested": {"replace": "new"}});
        deep_merge(&mut a, &b);
        assert_eq!(
            a,
            json!({"x": 1, "y": 2, "nested": {"keep": true, "replace": "new"}})
        );
    }

    #[test]
    fn arrays_concatenate() {
        let mut a = json!({"nodes": [{"id": 1}]});
        let b = json!({"nodes": [{"id": 2}]});
        deep_merge(&mut a, &b);
        assert_eq!(a, json!({"nodes": [{"id": 1}, {"id": 2}]}));
    }

    #[test]
    fn scalars_replace() {
        let mut a = json!("old");
        deep_merge(&mut a, &json!("new"));
        assert_eq!(a, json!("new"));
    }

    #[test]
    fn attr_bag_accumulates_class_and_style() {
        let mut bag = props([("class", "dark layout"), ("style", "color:red")]);
        merge_attr_bag(
            &mut bag,
            &props([("class", "layout page"), ("style", "margin:0")]),
        );
        assert_eq!(
            bag.get("class").and_then(Value::as_str),
            Some("dark layout page")
        );
        assert_eq!(
            bag.get("style").and_then(Value::as_str),
            Some("color:red;margin:0")
        );
    }

    #[test]
    fn attr_bag_overrides_other_attributes() {
        let mut bag = props([("lang", "en"), ("dir", "ltr")]);
        merge_attr_bag(&mut bag, &props([("lang", "fr")]));
        assert_eq!(bag.get("lang").and_then(Value::as_str), Some("fr"));
        assert_eq!(bag.get("dir").and_then(Value::as_str), Some("ltr"));
    }
}
