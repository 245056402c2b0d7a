//! Entry types for the head store.
//!
//! An Entry is one producer's raw contribution to the document head. It is
//! owned exclusively by the [`HeadStore`](super::HeadStore): created by
//! `push`, mutated only via `patch` (which replaces the input and invalidates
//! the cached tag list), and destroyed by `dispose`.

use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use super::input::HeadInput;
use crate::resolve::tag::Tag;

/// Unique identifier for an entry.
///
/// Ids are strictly increasing for the lifetime of the process, so comparing
/// two ids also compares push order. This is what makes last-write-wins
/// deduplication deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    /// Generate a new unique entry ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a logical producer (e.g. a component instance).
///
/// Pushing twice with the same scope while the first entry is still active
/// patches the existing entry instead of creating a second one. This keeps
/// entry creation idempotent under at-least-once lifecycle hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Generate a new unique scope ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for ScopeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// How an entry's input is interpreted during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMode {
    /// Input is taken as-is.
    #[default]
    Normal,

    /// Input is filtered through the fixed allow-list before resolution.
    /// Disallowed tags and attributes are dropped silently.
    Safe,

    /// Flat SEO meta shorthands (`ogTitle`, `twitterCard`, ...) are expanded
    /// into ordinary meta tags before resolution.
    Seo,
}

/// One producer's contribution to the head.
#[derive(Debug)]
pub struct Entry {
    /// Unique identifier, assigned at push time.
    id: EntryId,

    /// The raw head description supplied by the producer.
    input: HeadInput,

    /// How the input is interpreted.
    mode: EntryMode,

    /// Flattened tags derived from `input`. Filled lazily during resolution
    /// and invalidated whenever the input is replaced.
    tags: Option<SmallVec<[Tag; 8]>>,
}

impl Entry {
    /// Create a new entry around the given input.
    pub fn new(id: EntryId, input: HeadInput, mode: EntryMode) -> Self {
        Self {
            id,
            input,
            mode,
            tags: None,
        }
    }

    /// Get the entry's ID.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Get the entry's mode.
    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    /// Get the entry's current input.
    pub fn input(&self) -> &HeadInput {
        &self.input
    }

    /// Replace the input atomically, invalidating the cached tag list.
    pub fn replace_input(&mut self, input: HeadInput) {
        self.input = input;
        self.tags = None;
    }

    /// Drop the cached tag list so the next resolution re-derives it.
    pub fn invalidate(&mut self) {
        self.tags = None;
    }

    /// Get the flattened tags for this entry, deriving and caching them on
    /// first access after a push or patch.
    pub fn tags(&mut self) -> &[Tag] {
        if self.tags.is_none() {
            self.tags = Some(crate::resolve::flatten_entry(
                self.id, &self.input, self.mode,
            ));
        }
        self.tags.as_ref().map(|t| t.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_ids_are_unique_and_increasing() {
        let id1 = EntryId::new();
        let id2 = EntryId::new();
        let id3 = EntryId::new();

        assert!(id1 < id2);
        assert!(id2 < id3);
    }

    #[test]
    fn scope_ids_are_unique() {
        assert_ne!(ScopeId::new(), ScopeId::new());
    }

    #[test]
    fn patch_invalidates_cached_tags() {
        let mut entry = Entry::new(
            EntryId::new(),
            HeadInput {
                title: Some("one".into()),
                ..Default::default()
            },
            EntryMode::Normal,
        );

        assert_eq!(entry.tags().len(), 1);

        entry.replace_input(HeadInput {
            title: Some("two".into()),
            ..Default::default()
        });
        assert!(entry.tags.is_none());

        let tags = entry.tags();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].text_content.as_deref(), Some("two"));
    }
}
