//! Template injection.
//!
//! Rewrites an existing HTML document string so it reflects the resolved
//! head: head tags are injected before `</head>`, body tags around the body
//! region, and the resolved html/body attributes are merged into the
//! existing open tags. Markup not owned by a tracked tag is preserved.
//!
//! This is best-effort string surgery, not a full parser: a template
//! missing the relevant region keeps its content unchanged for that
//! region, and the rest is still rewritten.

use serde_json::Value;
use tracing::debug;

use crate::resolve::merge_attr_bag;
use crate::store::{HeadStore, TagProps};

use super::escape::find_case_insensitive;
use super::render::{render_attrs, render_ssr_head};

/// Inject the resolved head into an HTML document string.
pub fn transform_html_template(store: &HeadStore, html: &str) -> String {
    let out = render_ssr_head(store);
    let resolved = store.resolve();

    let mut html = html.to_string();

    // Merge resolved attributes into the existing open tags.
    if !resolved.html_attrs.is_empty() {
        html = merge_open_tag_attrs(&html, "html", &resolved.html_attrs);
    }
    if !resolved.body_attrs.is_empty() {
        html = merge_open_tag_attrs(&html, "body", &resolved.body_attrs);
    }

    // A template that already carries a title loses it when the resolved
    // head renders one; every other existing head tag is preserved.
    if resolved.title().is_some() {
        html = strip_element(&html, "title");
    }

    if !out.head_tags.is_empty() {
        match find_case_insensitive(&html, "</head>") {
            Some(pos) => {
                html.insert_str(pos, &format!("{}\n", out.head_tags));
            }
            None => debug!("template has no </head>; head tags skipped"),
        }
    }

    if !out.body_tags_open.is_empty() {
        match open_tag_end(&html, "body") {
            Some(pos) => {
                html.insert_str(pos, &format!("\n{}", out.body_tags_open));
            }
            None => debug!("template has no <body>; body-open tags skipped"),
        }
    }

    if !out.body_tags.is_empty() {
        match find_case_insensitive(&html, "</body>") {
            Some(pos) => {
                html.insert_str(pos, &format!("{}\n", out.body_tags));
            }
            None => debug!("template has no </body>; body-close tags skipped"),
        }
    }

    html
}

/// Byte offset just past `>` of the `<name ...>` open tag.
fn open_tag_start(html: &str, name: &str) -> Option<(usize, usize)> {
    let needle = format!("<{}", name);
    let mut from = 0;
    while let Some(rel) = find_case_insensitive(&html[from..], &needle) {
        let start = from + rel;
        let after = html[start + needle.len()..].chars().next();
        // Reject prefixes like `<header>` when searching for `<head>`.
        if matches!(after, Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r')) {
            let end = html[start..].find('>')?;
            return Some((start, start + end + 1));
        }
        from = start + needle.len();
    }
    None
}

fn open_tag_end(html: &str, name: &str) -> Option<usize> {
    open_tag_start(html, name).map(|(_, end)| end)
}

/// Merge resolved attributes into an existing open tag, preserving
/// attributes the template already carries.
fn merge_open_tag_attrs(html: &str, name: &str, attrs: &TagProps) -> String {
    let Some((start, end)) = open_tag_start(html, name) else {
        debug!(tag = name, "template has no open tag; attributes skipped");
        return html.to_string();
    };

    let open = &html[start..end];
    let inner = open
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_end_matches('/');
    let existing = parse_attrs(&inner[name.len()..]);

    let mut merged = TagProps::new();
    for (key, value) in existing {
        merged.insert(key, Value::String(value.unwrap_or_default()));
    }
    merge_attr_bag(&mut merged, attrs);

    let mut rebuilt = format!("<{}{}", name, render_attrs(&merged));
    rebuilt.push('>');

    let mut out = String::with_capacity(html.len() + rebuilt.len());
    out.push_str(&html[..start]);
    out.push_str(&rebuilt);
    out.push_str(&html[end..]);
    out
}

/// Remove the first `<name ...>...</name>` element, if present.
fn strip_element(html: &str, name: &str) -> String {
    let Some((start, open_end)) = open_tag_start(html, name) else {
        return html.to_string();
    };
    let close = format!("</{}>", name);
    match find_case_insensitive(&html[open_end..], &close) {
        Some(rel) => {
            let end = open_end + rel + close.len();
            let mut out = String::with_capacity(html.len());
            out.push_str(&html[..start]);
            out.push_str(&html[end..]);
            out
        }
        None => html.to_string(),
    }
}

/// Minimal attribute scanner for an open tag's interior.
fn parse_attrs(input: &str) -> Vec<(String, Option<String>)> {
    let mut attrs = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        // Attribute name.
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == '=' {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        let key = input[start..end].to_string();
        if key.is_empty() {
            break;
        }

        // Skip whitespace before a possible `=`.
        while matches!(chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
            chars.next();
        }

        if !matches!(chars.peek(), Some(&(_, '='))) {
            attrs.push((key, None));
            continue;
        }
        chars.next();
        while matches!(chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
            chars.next();
        }

        let value = match chars.peek() {
            Some(&(vstart, quote)) if quote == '"' || quote == '\'' => {
                chars.next();
                let content_start = vstart + 1;
                let mut content_end = content_start;
                for (i, c) in chars.by_ref() {
                    if c == quote {
                        break;
                    }
                    content_end = i + c.len_utf8();
                }
                input[content_start..content_end].to_string()
            }
            Some(&(vstart, _)) => {
                let mut content_end = vstart;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    content_end = i + c.len_utf8();
                    chars.next();
                }
                input[vstart..content_end].to_string()
            }
            None => String::new(),
        };
        attrs.push((key, Some(value)));
    }

    attrs
}
