//! Raw head input types.
//!
//! A [`HeadInput`] is the structured description a producer hands to the
//! store: a title, collections of meta/link/style/script/noscript tags, and
//! attribute bags for the root and body elements. Inputs are plain data and
//! fully serializable; malformed shapes are accepted here and surface as
//! resolution-time concerns, never as push-time errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolve::tag::TagPosition;

/// Attribute map for a single tag.
///
/// Backed by `serde_json::Map`, which iterates in sorted key order, so
/// serialization of the same props is always byte-identical.
pub type TagProps = serde_json::Map<String, Value>;

/// One raw tag description inside a [`HeadInput`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagInput {
    /// Attributes for the rendered element. Boolean `true` renders as a bare
    /// attribute, `false`/`null` omit the attribute entirely.
    pub props: TagProps,

    /// Inner text for paired tags (title, style, script, noscript).
    pub text_content: Option<String>,

    /// Explicit dedupe key. Tags sharing a key collapse to one element.
    pub key: Option<String>,

    /// Where the rendered element is placed. Only honored for script,
    /// noscript and style tags; everything else belongs in the head.
    pub position: Option<TagPosition>,

    /// Explicit rendering weight. Lower values render earlier. Tags without
    /// a priority keep push order.
    pub priority: Option<i32>,
}

impl TagInput {
    /// Convenience constructor from an attribute list.
    pub fn from_props<I, K>(props: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            props: props.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Default::default()
        }
    }

    /// Set the explicit dedupe key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the inner text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Set the rendering position.
    pub fn with_position(mut self, position: TagPosition) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the explicit rendering weight.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// A producer's structured head description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadInput {
    /// Document title.
    pub title: Option<String>,

    /// Title template. `%s` is substituted with the resolved title.
    pub title_template: Option<String>,

    /// `<base>` attributes. Singleton across the whole head.
    pub base: Option<TagProps>,

    /// `<meta>` tags.
    pub meta: Vec<TagInput>,

    /// `<link>` tags.
    pub link: Vec<TagInput>,

    /// `<style>` tags.
    pub style: Vec<TagInput>,

    /// `<script>` tags.
    pub script: Vec<TagInput>,

    /// `<noscript>` tags.
    pub noscript: Vec<TagInput>,

    /// Attributes merged onto the root `<html>` element.
    pub html_attrs: TagProps,

    /// Attributes merged onto the `<body>` element.
    pub body_attrs: TagProps,
}

impl HeadInput {
    /// An input with just a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// True when the input contributes nothing to the head.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.title_template.is_none()
            && self.base.is_none()
            && self.meta.is_empty()
            && self.link.is_empty()
            && self.style.is_empty()
            && self.script.is_empty()
            && self.noscript.is_empty()
            && self.html_attrs.is_empty()
            && self.body_attrs.is_empty()
    }
}

/// Shorthand for building a [`TagProps`] map from string pairs.
pub fn props<I, K, V>(pairs: I) -> TagProps
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_reports_empty() {
        assert!(HeadInput::default().is_empty());
        assert!(!HeadInput::titled("x").is_empty());
    }

    #[test]
    fn input_round_trips_through_serde() {
        let input = HeadInput {
            title: Some("Home".into()),
            meta: vec![TagInput::from_props(props([
                ("name", "description"),
                ("content", "hello"),
            ]))],
            ..Default::default()
        };

        let json = serde_json::to_string(&input).expect("serialize");
        let back: HeadInput = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, input);
    }

    #[test]
    fn props_iterate_in_sorted_order() {
        let p = props([("z", "1"), ("a", "2"), ("m", "3")]);
        let keys: Vec<&str> = p.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }
}
