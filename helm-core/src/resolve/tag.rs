//! Resolved tag model.
//!
//! A [`Tag`] is one element of the resolved head: immutable once produced by
//! a resolution pass, carrying provenance back to the entry that contributed
//! it. Two tags with the same dedupe key never both survive a pass.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::entry::EntryId;
use crate::store::input::TagProps;

/// The element kinds that can appear in a resolved head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagName {
    Title,
    Base,
    Meta,
    Link,
    Style,
    Script,
    Noscript,
}

impl TagName {
    /// The HTML element name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagName::Title => "title",
            TagName::Base => "base",
            TagName::Meta => "meta",
            TagName::Link => "link",
            TagName::Style => "style",
            TagName::Script => "script",
            TagName::Noscript => "noscript",
        }
    }

    /// Void elements serialize without a closing tag.
    pub fn is_void(&self) -> bool {
        matches!(self, TagName::Base | TagName::Meta | TagName::Link)
    }

    /// Whether this element kind may be rendered outside the head.
    pub fn supports_body_position(&self) -> bool {
        matches!(self, TagName::Script | TagName::Noscript | TagName::Style)
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a resolved tag is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TagPosition {
    /// Inside `<head>`.
    #[default]
    Head,

    /// Immediately after `<body>` opens.
    BodyOpen,

    /// Immediately before `</body>`.
    BodyClose,
}

/// One element of a resolved head.
///
/// Tags are immutable once produced for a given revision; a new revision
/// produces new values.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// Element kind.
    pub name: TagName,

    /// Element attributes.
    pub props: TagProps,

    /// Inner text for paired tags.
    pub text_content: Option<String>,

    /// Explicit dedupe key, if the producer supplied one.
    pub key: Option<String>,

    /// The entry this tag came from. Lookup only; the entry may already be
    /// gone by the time the tag is inspected.
    pub entry_id: EntryId,

    /// Index of this tag within its entry's input array. Final tie-break for
    /// deterministic ordering.
    pub index: usize,

    /// Where the element is rendered.
    pub position: TagPosition,

    /// Explicit rendering weight, lower renders earlier.
    pub priority: Option<i32>,
}

impl Tag {
    /// The dedupe key for this tag, if it participates in deduplication.
    ///
    /// Rule table:
    /// - explicit `key` wins for any tag kind;
    /// - `title` and `base` are global singletons;
    /// - `meta` dedupes on its identifying attribute (`charset`, `name`,
    ///   `property`, `http-equiv`) plus that attribute's value;
    /// - `link` dedupes on `rel` + `href`;
    /// - everything else is unique per occurrence.
    pub fn dedupe_key(&self) -> Option<String> {
        if let Some(key) = &self.key {
            return Some(format!("{}:key:{}", self.name, key));
        }
        match self.name {
            TagName::Title => Some("title".to_string()),
            TagName::Base => Some("base".to_string()),
            TagName::Meta => {
                for ident in ["charset", "name", "property", "http-equiv"] {
                    if let Some(value) = self.props.get(ident) {
                        return Some(format!("meta:{}:{}", ident, prop_to_string(value)));
                    }
                }
                None
            }
            TagName::Link => {
                let rel = self.props.get("rel")?;
                let href = self.props.get("href")?;
                Some(format!(
                    "link:{}:{}",
                    prop_to_string(rel),
                    prop_to_string(href)
                ))
            }
            _ => None,
        }
    }

    /// Stable identity for this tag within a resolved head.
    ///
    /// The dedupe key when one exists, otherwise a provenance id unique per
    /// occurrence but stable across patches of the same entry. The
    /// reconciler uses this to find the DOM node it created for the tag, so
    /// a patched-but-still-present tag is updated in place instead of being
    /// recreated.
    pub fn hash(&self) -> String {
        if let Some(key) = self.dedupe_key() {
            return key;
        }
        format!("{}:e{}:{}", self.name, self.entry_id.raw(), self.index)
    }

    /// Short marker value suitable for a `data-hm` attribute.
    ///
    /// Only tags with an explicit key get a marker; it is how server-rendered
    /// elements are re-found during hydration.
    pub fn marker(&self) -> Option<String> {
        self.key.clone()
    }
}

/// Render an attribute value as text.
///
/// Booleans become presence/absence, so `true` renders as the empty string
/// and callers skip `false` entirely. Structured values serialize as JSON.
pub fn prop_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => String::new(),
        Value::Bool(false) | Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Whether an attribute with this value should be rendered at all.
pub fn prop_is_rendered(value: &Value) -> bool {
    !matches!(value, Value::Bool(false) | Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn title_and_base_are_singletons() {
        assert_eq!(
            tag(TagName::Title, TagProps::new()).dedupe_key(),
            Some("title".to_string())
        );
        assert_eq!(
            tag(TagName::Base, props([("href", "/")])).dedupe_key(),
            Some("base".to_string())
        );
    }

    #[test]
    fn meta_dedupes_on_identifying_attribute() {
        let t = tag(
            TagName::Meta,
            props([("name", "description"), ("content", "a")]),
        );
        assert_eq!(t.dedupe_key(), Some("meta:name:description".to_string()));

        let charset = tag(TagName::Meta, props([("charset", "utf-8")]));
        assert_eq!(charset.dedupe_key(), Some("meta:charset:utf-8".to_string()));
    }

    #[test]
    fn link_dedupes_on_rel_and_href() {
        let t = tag(
            TagName::Link,
            props([("rel", "icon"), ("href", "/favicon.ico")]),
        );
        assert_eq!(t.dedupe_key(), Some("link:icon:/favicon.ico".to_string()));

        let no_href = tag(TagName::Link, props([("rel", "icon")]));
        assert_eq!(no_href.dedupe_key(), None);
    }

    #[test]
    fn explicit_key_overrides_rule_table() {
        let mut t = tag(
            TagName::Meta,
            props([("name", "description"), ("content", "a")]),
        );
        t.key = Some("desc".to_string());
        assert_eq!(t.dedupe_key(), Some("meta:key:desc".to_string()));
    }

    #[test]
    fn hash_is_stable_across_patches_of_the_same_entry() {
        let a = tag(TagName::Style, props([("media", "screen")]));
        let mut b = tag(TagName::Style, props([("media", "print")]));
        b.entry_id = a.entry_id;
        // Same provenance, changed content: identity holds.
        assert_eq!(a.hash(), b.hash());

        let c = tag(TagName::Style, props([("media", "screen")]));
        assert_ne!(a.hash(), c.hash());
    }
}
