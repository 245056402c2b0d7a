//! Flat SEO meta expansion.
//!
//! Entries in [`EntryMode::Seo`](crate::store::EntryMode::Seo) may describe
//! meta tags as a flat camelCase map (`ogTitle`, `twitterCard`,
//! `description`, ...) instead of explicit `name`/`property` pairs. This
//! module expands each flat key into an ordinary meta tag before
//! resolution, so downstream the entry is indistinguishable from a normal
//! producer.
//!
//! Expansion rules:
//! - camelCase keys split into `:`-separated lowercase segments
//!   (`twitterImageAlt` → `twitter:image:alt`);
//! - `og*`, `fb*` and `article*` keys become `property` attributes,
//!   everything else becomes `name`;
//! - a small fixup table covers OpenGraph keys that use underscores
//!   (`ogSiteName` → `og:site_name`);
//! - the value becomes `content`; inputs already carrying an identifying
//!   attribute (including `charset`) pass through untouched.

use serde_json::Value;

use crate::store::input::{TagInput, TagProps};

/// Identifying attributes; a meta input carrying any of these is already
/// explicit and is left untouched.
const IDENTIFYING: &[&str] = &["charset", "name", "property", "http-equiv"];

/// OpenGraph segment pairs that join with `_` instead of `:`.
const UNDERSCORE_FIXUPS: &[(&str, &str)] = &[
    ("og:site:name", "og:site_name"),
    ("og:image:secure:url", "og:image:secure_url"),
    ("og:video:secure:url", "og:video:secure_url"),
    ("og:country:name", "og:country_name"),
    ("og:postal:code", "og:postal_code"),
    ("og:street:address", "og:street_address"),
];

/// Split a camelCase key into `:`-joined lowercase segments.
fn key_to_meta_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push(':');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    for (from, to) in UNDERSCORE_FIXUPS {
        if out == *from {
            return (*to).to_string();
        }
    }
    out
}

/// Whether an expanded key addresses a `property` attribute rather than
/// `name`.
fn is_property_key(name: &str) -> bool {
    name.starts_with("og:") || name.starts_with("fb:") || name.starts_with("article:")
}

/// Expand one flat meta input into explicit meta inputs.
///
/// Inputs that already carry an identifying attribute pass through
/// unchanged. A single flat input may expand to several meta tags, one per
/// flat key; array values expand to one tag per element.
pub fn expand_flat_meta(input: &TagInput) -> Vec<TagInput> {
    if IDENTIFYING.iter().any(|k| input.props.contains_key(*k)) {
        return vec![input.clone()];
    }

    let mut out = Vec::new();
    for (key, value) in &input.props {
        let values: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for value in values {
            let mut props = TagProps::new();
            let meta_name = key_to_meta_name(key);
            let attr = if is_property_key(&meta_name) {
                "property"
            } else {
                "name"
            };
            props.insert(attr.to_string(), Value::String(meta_name));
            props.insert("content".to_string(), value.clone());
            out.push(TagInput {
                props,
                text_content: None,
                key: input.key.clone(),
                position: None,
                priority: input.priority,
            });
        }
    }
    out
}
