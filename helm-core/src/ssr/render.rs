//! Server-side head serialization.
//!
//! Turns a resolved head into the HTML fragments a server template needs:
//! concatenated head tags, body-open and body-close tags, and attribute
//! strings for the root and body elements.

use crate::resolve::tag::{prop_is_rendered, prop_to_string};
use crate::resolve::{Tag, TagName, TagPosition};
use crate::store::{HeadStore, TagProps};

use super::escape::{escape_attr, escape_text, guard_raw_text};

/// Marker attribute carrying a keyed tag's identity into the markup, so a
/// hydrating client can re-find server-rendered elements.
pub const MARKER_ATTR: &str = "data-hm";

/// Serialized output of one SSR pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SsrOutput {
    /// Tags rendered inside `<head>`.
    pub head_tags: String,

    /// Tags rendered right after `<body>` opens.
    pub body_tags_open: String,

    /// Tags rendered right before `</body>`.
    pub body_tags: String,

    /// Attribute string for the root `<html>` element.
    pub html_attrs: String,

    /// Attribute string for the `<body>` element.
    pub body_attrs: String,
}

/// Serialize an attribute map.
///
/// Keys iterate in sorted order, so equal props always serialize
/// identically. `true` renders as a bare attribute; `false` and `null`
/// render nothing.
pub fn render_attrs(props: &TagProps) -> String {
    let mut out = String::new();
    for (key, value) in props {
        if !prop_is_rendered(value) {
            continue;
        }
        out.push(' ');
        out.push_str(&escape_attr(key));
        let text = prop_to_string(value);
        if !text.is_empty() || !value.is_boolean() {
            out.push_str("=\"");
            out.push_str(&escape_attr(&text));
            out.push('"');
        }
    }
    out
}

/// Serialize one resolved tag.
pub fn render_tag(tag: &Tag) -> String {
    let name = tag.name.as_str();
    let mut out = String::new();
    out.push('<');
    out.push_str(name);
    out.push_str(&render_attrs(&tag.props));
    if let Some(marker) = tag.marker() {
        out.push_str(&format!(" {}=\"{}\"", MARKER_ATTR, escape_attr(&marker)));
    }
    out.push('>');

    if tag.name.is_void() {
        return out;
    }

    if let Some(text) = &tag.text_content {
        let body = match tag.name {
            TagName::Script => guard_raw_text(text, "script"),
            TagName::Style => guard_raw_text(text, "style"),
            _ => escape_text(text),
        };
        out.push_str(&body);
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
    out
}

fn render_position(tags: &[&Tag]) -> String {
    tags.iter()
        .map(|t| render_tag(t))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize the store's resolved head for server rendering.
pub fn render_ssr_head(store: &HeadStore) -> SsrOutput {
    let resolved = store.resolve();

    let head: Vec<&Tag> = resolved.tags_at(TagPosition::Head).collect();
    let body_open: Vec<&Tag> = resolved.tags_at(TagPosition::BodyOpen).collect();
    let body_close: Vec<&Tag> = resolved.tags_at(TagPosition::BodyClose).collect();

    SsrOutput {
        head_tags: render_position(&head),
        body_tags_open: render_position(&body_open),
        body_tags: render_position(&body_close),
        html_attrs: render_attrs(&resolved.html_attrs).trim_start().to_string(),
        body_attrs: render_attrs(&resolved.body_attrs).trim_start().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::TagPosition;
    use crate::store::{props, HeadInput, TagInput};

    #[test]
    fn renders_title_and_meta() {
        let store = HeadStore::new();
        store.push(HeadInput {
            title: Some("SSR Title".into()),
            meta: vec![TagInput::from_props(props([
                ("name", "description"),
                ("content", "SSR Description"),
            ]))],
            ..Default::default()
        });

        let out = render_ssr_head(&store);
        assert!(out.head_tags.contains("<title>SSR Title</title>"));
        assert!(out
            .head_tags
            .contains(r#"<meta content="SSR Description" name="description">"#));
    }

    #[test]
    fn void_tags_have_no_closing_tag() {
        let store = HeadStore::new();
        store.push(HeadInput {
            link: vec![TagInput::from_props(props([
                ("rel", "icon"),
                ("href", "/favicon.ico"),
            ]))],
            ..Default::default()
        });

        let out = render_ssr_head(&store);
        assert!(out.head_tags.contains(r#"<link href="/favicon.ico" rel="icon">"#));
        assert!(!out.head_tags.contains("</link>"));
    }

    #[test]
    fn escapes_attribute_injection() {
        let store = HeadStore::new();
        store.push(HeadInput {
            meta: vec![TagInput::from_props(props([
                ("name", "description"),
                ("content", r#""><script>alert(1)</script>"#),
            ]))],
            ..Default::default()
        });

        let out = render_ssr_head(&store);
        assert!(!out.head_tags.contains("<script>alert"));
        assert!(out.head_tags.contains("&quot;&gt;&lt;script&gt;"));
    }

    #[test]
    fn escapes_title_text() {
        let store = HeadStore::new();
        store.push(HeadInput::titled("a < b & c"));
        let out = render_ssr_head(&store);
        assert!(out.head_tags.contains("<title>a &lt; b &amp; c</title>"));
    }

    #[test]
    fn bare_boolean_attributes() {
        let store = HeadStore::new();
        store.push(HeadInput {
            script: vec![TagInput::from_props(props([
                ("src", serde_json::json!("/app.js")),
                ("async", serde_json::json!(true)),
                ("defer", serde_json::json!(false)),
            ]))],
            ..Default::default()
        });

        let out = render_ssr_head(&store);
        assert!(out.head_tags.contains(r#"<script async src="/app.js">"#));
        assert!(!out.head_tags.contains("defer"));
    }

    #[test]
    fn keyed_tags_carry_marker() {
        let store = HeadStore::new();
        store.push(HeadInput {
            script: vec![TagInput::from_props(props([(
                "type",
                "application/ld+json",
            )]))
            .with_text("{}")
            .with_key("graph")
            .with_position(TagPosition::BodyClose)],
            ..Default::default()
        });

        let out = render_ssr_head(&store);
        assert!(out.head_tags.is_empty());
        assert!(out.body_tags.contains(r#"data-hm="graph""#));
    }

    #[test]
    fn script_body_cannot_close_early() {
        let store = HeadStore::new();
        store.push(HeadInput {
            script: vec![TagInput::from_props(props([(
                "type",
                "application/json",
            )]))
            .with_text(r#"{"x":"</script><script>alert(1)"}"#)],
            ..Default::default()
        });

        let out = render_ssr_head(&store);
        assert!(!out.head_tags.contains("</script><script>alert"));
    }

    #[test]
    fn html_and_body_attr_strings() {
        let store = HeadStore::new();
        store.push(HeadInput {
            html_attrs: props([("lang", "en"), ("class", "dark")]),
            body_attrs: props([("class", "page")]),
            ..Default::default()
        });

        let out = render_ssr_head(&store);
        assert_eq!(out.html_attrs, r#"class="dark" lang="en""#);
        assert_eq!(out.body_attrs, r#"class="page""#);
    }

    #[test]
    fn output_is_stable_across_calls() {
        let store = HeadStore::new();
        store.push(HeadInput {
            title: Some("T".into()),
            meta: vec![TagInput::from_props(props([
                ("name", "robots"),
                ("content", "noindex"),
            ]))],
            ..Default::default()
        });

        assert_eq!(render_ssr_head(&store), render_ssr_head(&store));
    }
}
