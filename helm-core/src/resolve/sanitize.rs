//! Safe-mode sanitization.
//!
//! Entries pushed in [`EntryMode::Safe`](crate::store::EntryMode::Safe) are
//! filtered through a fixed allow-list before deduplication. Violations are
//! dropped silently and logged; sanitization never fails, so one misbehaving
//! producer cannot break the whole head.
//!
//! The list is deliberately conservative: no `base`, no inline `style`, no
//! external scripts, no event handlers, no javascript/data URLs.

use serde_json::Value;
use tracing::warn;

use super::tag::{Tag, TagName};
use crate::store::input::TagProps;

/// Attribute allow-list per tag kind.
fn allowed_attrs(name: TagName) -> &'static [&'static str] {
    match name {
        TagName::Title => &[],
        TagName::Meta => &["charset", "content", "media", "name", "property"],
        TagName::Link => &[
            "color",
            "crossorigin",
            "fetchpriority",
            "href",
            "hreflang",
            "imagesizes",
            "imagesrcset",
            "integrity",
            "media",
            "referrerpolicy",
            "rel",
            "sizes",
            "type",
        ],
        TagName::Script => &["type", "id", "nonce"],
        TagName::Noscript => &["id"],
        // Dropped wholesale in safe mode.
        TagName::Base | TagName::Style => &[],
    }
}

/// Attribute allow-list for the html/body attribute bags.
const SAFE_BAG_ATTRS: &[&str] = &["class", "style", "lang", "dir"];

/// Script types that may carry inline content in safe mode.
const SAFE_SCRIPT_TYPES: &[&str] = &["application/json", "application/ld+json"];

/// `link` relations that may load or execute content and are therefore
/// rejected in safe mode.
const UNSAFE_LINK_RELS: &[&str] = &["stylesheet", "preload", "modulepreload", "prefetch"];

/// Whether a URL-valued attribute is acceptable.
fn safe_url(value: &str) -> bool {
    let trimmed = value.trim().to_ascii_lowercase();
    !(trimmed.starts_with("javascript:") || trimmed.starts_with("data:"))
}

/// Sanitize one candidate tag in place.
///
/// Returns `false` when the whole tag must be dropped.
pub fn sanitize_tag(tag: &mut Tag) -> bool {
    match tag.name {
        TagName::Base | TagName::Style => {
            warn!(tag = %tag.name, "dropping disallowed tag in safe mode");
            return false;
        }
        TagName::Script => {
            let json_type = tag
                .props
                .get("type")
                .and_then(Value::as_str)
                .map(|t| SAFE_SCRIPT_TYPES.contains(&t))
                .unwrap_or(false);
            if !json_type {
                warn!("dropping non-JSON script in safe mode");
                return false;
            }
        }
        TagName::Link => {
            if let Some(rel) = tag.props.get("rel").and_then(Value::as_str) {
                if UNSAFE_LINK_RELS.contains(&rel.to_ascii_lowercase().as_str()) {
                    warn!(rel, "dropping link with unsafe rel in safe mode");
                    return false;
                }
            }
            if let Some(href) = tag.props.get("href").and_then(Value::as_str) {
                if !safe_url(href) {
                    warn!("dropping link with unsafe href in safe mode");
                    return false;
                }
            }
        }
        _ => {}
    }

    let allowed = allowed_attrs(tag.name);
    tag.props.retain(|k, _| {
        let keep = allowed.contains(&k.as_str());
        if !keep {
            warn!(tag = %tag.name, attr = %k, "stripping disallowed attribute in safe mode");
        }
        keep
    });

    // Explicit keys survive; they are identity, not markup.
    true
}

/// Sanitize an html/body attribute bag in place.
pub fn sanitize_attr_bag(bag: &mut TagProps) {
    bag.retain(|k, _| {
        let keep = SAFE_BAG_ATTRS.contains(&k.as_str());
        if !keep {
            warn!(attr = %k, "stripping disallowed root attribute in safe mode");
        }
        keep
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::tag::TagPosition;
    use crate::store::entry::EntryId;
    use crate::store::input::props;

    fn tag(name: TagName, p: TagProps) -> Tag {
        Tag {
            name,
            props: p,
            text_content: None,
            key: None,
            entry_id: EntryId::new(),
            index: 0,
            position: TagPosition::Head,
            priority: None,
        }
    }

    #[test]
    fn strips_event_handler_attributes() {
        let mut t = tag(
            TagName::Meta,
            props([("name", "description"), ("content", "x"), ("onload", "evil()")]),
        );
        assert!(sanitize_tag(&mut t));
        assert!(t.props.get("onload").is_none());
        assert!(t.props.get("name").is_some());
    }

    #[test]
    fn drops_style_and_base_tags() {
        let mut style = tag(TagName::Style, TagProps::new());
        assert!(!sanitize_tag(&mut style));

        let mut base = tag(TagName::Base, props([("href", "/")]));
        assert!(!sanitize_tag(&mut base));
    }

    #[test]
    fn drops_external_scripts_but_keeps_json() {
        let mut external = tag(TagName::Script, props([("src", "https://cdn/x.js")]));
        assert!(!sanitize_tag(&mut external));

        let mut json = tag(TagName::Script, props([("type", "application/ld+json")]));
        json.text_content = Some("{}".into());
        assert!(sanitize_tag(&mut json));
    }

    #[test]
    fn drops_links_with_unsafe_rel_or_scheme() {
        let mut sheet = tag(
            TagName::Link,
            props([("rel", "stylesheet"), ("href", "/x.css")]),
        );
        assert!(!sanitize_tag(&mut sheet));

        let mut js_href = tag(
            TagName::Link,
            props([("rel", "icon"), ("href", "javascript:alert(1)")]),
        );
        assert!(!sanitize_tag(&mut js_href));

        let mut icon = tag(
            TagName::Link,
            props([("rel", "icon"), ("href", "/favicon.ico")]),
        );
        assert!(sanitize_tag(&mut icon));
    }

    #[test]
    fn attr_bag_keeps_only_presentation_attributes() {
        let mut bag = props([("class", "a"), ("lang", "en"), ("onload", "evil()")]);
        sanitize_attr_bag(&mut bag);
        assert!(bag.get("onload").is_none());
        assert!(bag.get("class").is_some());
        assert!(bag.get("lang").is_some());
    }
}
