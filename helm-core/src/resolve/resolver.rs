//! Head resolution.
//!
//! Resolution is a pure function from the ordered sequence of active entries
//! to a [`ResolvedHead`]: flatten every entry's input into candidate tags,
//! dedupe them under the key rules, merge attribute bags, then sort the
//! survivors deterministically. Calling it twice for an unchanged store
//! yields byte-identical output.
//!
//! # Conflict rules
//!
//! 1. Candidates sharing a dedupe key from *different* entries: the
//!    latest-pushed entry wins outright, except the structured `json`
//!    payload, which accumulates across entries (later fragments override
//!    same-named fields of earlier ones).
//!
//! 2. Candidates sharing a dedupe key within the *same* entry: structured
//!    payloads deep-merge instead of replacing, so several fragments build
//!    up one tag.
//!
//! 3. Attribute bags merge per-attribute across entries; `class` and
//!    `style` accumulate.

use indexmap::map::Entry as MapEntry;
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;

use super::merge::{deep_merge, merge_attr_bag, merge_props};
use super::sanitize::{sanitize_attr_bag, sanitize_tag};
use super::seo::expand_flat_meta;
use super::tag::{Tag, TagName, TagPosition};
use crate::store::entry::{Entry, EntryId, EntryMode};
use crate::store::input::{HeadInput, TagInput, TagProps};

/// Props key carrying a structured payload for script tags.
///
/// The merged value is serialized into the tag's text content at the end of
/// the pass. This is the channel JSON-LD graphs accumulate through.
pub const JSON_PAYLOAD_PROP: &str = "json";

/// The deduplicated, ordered tag set derived from all active entries at a
/// given revision.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedHead {
    /// Store revision this head was resolved from.
    pub revision: u64,

    /// Final ordered tag list.
    pub tags: Vec<Tag>,

    /// Merged attributes for the root `<html>` element.
    pub html_attrs: TagProps,

    /// Merged attributes for the `<body>` element.
    pub body_attrs: TagProps,
}

impl ResolvedHead {
    /// The resolved document title, if any entry set one.
    pub fn title(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == TagName::Title)
            .and_then(|t| t.text_content.as_deref())
    }

    /// Tags rendered at the given position.
    pub fn tags_at(&self, position: TagPosition) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(move |t| t.position == position)
    }

    /// Tags of the given kind, in output order.
    pub fn tags_named(&self, name: TagName) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(move |t| t.name == name)
    }
}

/// Flatten one entry's input into candidate tags with provenance.
///
/// Applies the entry's mode: safe-mode sanitization and SEO flat-meta
/// expansion both happen here, before any deduplication.
pub(crate) fn flatten_entry(
    id: EntryId,
    input: &HeadInput,
    mode: EntryMode,
) -> SmallVec<[Tag; 8]> {
    let mut tags = SmallVec::new();
    let mut index = 0usize;

    let mut push = |tags: &mut SmallVec<[Tag; 8]>, mut tag: Tag| {
        if mode == EntryMode::Safe && !sanitize_tag(&mut tag) {
            return;
        }
        tag.index = index;
        index += 1;
        tags.push(tag);
    };

    if let Some(title) = &input.title {
        push(
            &mut tags,
            Tag {
                name: TagName::Title,
                props: TagProps::new(),
                text_content: Some(title.clone()),
                key: None,
                entry_id: id,
                index: 0,
                position: TagPosition::Head,
                priority: None,
            },
        );
    }

    if let Some(base) = &input.base {
        push(&mut tags, raw_tag(TagName::Base, id, &TagInput {
            props: base.clone(),
            ..Default::default()
        }));
    }

    if mode == EntryMode::Seo {
        for item in &input.meta {
            for expanded in expand_flat_meta(item) {
                push(&mut tags, raw_tag(TagName::Meta, id, &expanded));
            }
        }
    } else {
        for item in &input.meta {
            push(&mut tags, raw_tag(TagName::Meta, id, item));
        }
    }

    for item in &input.link {
        push(&mut tags, raw_tag(TagName::Link, id, item));
    }
    for item in &input.style {
        push(&mut tags, raw_tag(TagName::Style, id, item));
    }
    for item in &input.script {
        push(&mut tags, raw_tag(TagName::Script, id, item));
    }
    for item in &input.noscript {
        push(&mut tags, raw_tag(TagName::Noscript, id, item));
    }

    tags
}

fn raw_tag(name: TagName, entry_id: EntryId, input: &TagInput) -> Tag {
    let position = match input.position {
        Some(p) if name.supports_body_position() => p,
        _ => TagPosition::Head,
    };
    Tag {
        name,
        props: input.props.clone(),
        text_content: input.text_content.clone(),
        key: input.key.clone(),
        entry_id,
        index: 0,
        position,
        priority: input.priority,
    }
}

/// Resolve the ordered entries into a head.
///
/// Entries must be supplied in push order; that order is the precedence for
/// every last-write-wins rule.
pub fn resolve<'a>(
    entries: impl IntoIterator<Item = &'a mut Entry>,
    revision: u64,
) -> ResolvedHead {
    let mut groups: IndexMap<String, Tag> = IndexMap::new();
    let mut html_attrs = TagProps::new();
    let mut body_attrs = TagProps::new();
    let mut title_template: Option<String> = None;

    for entry in entries {
        let mode = entry.mode();

        let mut html_bag = entry.input().html_attrs.clone();
        let mut body_bag = entry.input().body_attrs.clone();
        if mode == EntryMode::Safe {
            sanitize_attr_bag(&mut html_bag);
            sanitize_attr_bag(&mut body_bag);
        }
        merge_attr_bag(&mut html_attrs, &html_bag);
        merge_attr_bag(&mut body_attrs, &body_bag);

        if let Some(template) = &entry.input().title_template {
            title_template = Some(template.clone());
        }

        for tag in entry.tags() {
            match groups.entry(tag.hash()) {
                MapEntry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    if existing.entry_id == tag.entry_id {
                        // Same entry, same key: fragments accumulate.
                        merge_props(&mut existing.props, &tag.props);
                        if tag.text_content.is_some() {
                            existing.text_content = tag.text_content.clone();
                        }
                        if tag.priority.is_some() {
                            existing.priority = tag.priority;
                        }
                        existing.position = tag.position;
                    } else {
                        // Later entry wins outright, but structured payloads
                        // carry over so JSON-LD graphs accumulate across
                        // producers.
                        let mut replacement = tag.clone();
                        if let (Some(earlier), Some(later)) = (
                            existing.props.get(JSON_PAYLOAD_PROP),
                            tag.props.get(JSON_PAYLOAD_PROP),
                        ) {
                            let mut merged = earlier.clone();
                            deep_merge(&mut merged, later);
                            replacement
                                .props
                                .insert(JSON_PAYLOAD_PROP.to_string(), merged);
                        }
                        *existing = replacement;
                    }
                }
                MapEntry::Vacant(slot) => {
                    slot.insert(tag.clone());
                }
            }
        }
    }

    let mut tags: Vec<Tag> = groups.into_values().collect();

    if let Some(template) = title_template {
        if let Some(title) = tags.iter_mut().find(|t| t.name == TagName::Title) {
            let current = title.text_content.clone().unwrap_or_default();
            title.text_content = Some(template.replace("%s", &current));
        }
    }

    // Serialize accumulated payloads into text content.
    for tag in &mut tags {
        if tag.name == TagName::Script {
            if let Some(payload) = tag.props.remove(JSON_PAYLOAD_PROP) {
                match serde_json::to_string_pretty(&payload) {
                    Ok(json) => tag.text_content = Some(json),
                    Err(err) => debug!(%err, "failed to serialize script payload"),
                }
            }
        }
    }

    tags.sort_by_key(|t| (t.priority.unwrap_or(0), t.entry_id, t.index));

    ResolvedHead {
        revision,
        tags,
        html_attrs,
        body_attrs,
    }
}
