//! The head store.
//!
//! A [`HeadStore`] owns every active entry in push order, a revision counter
//! that advances on each observable mutation, the memoized resolved head for
//! the current revision, and the per-source script loader registry.
//!
//! # How the store works
//!
//! 1. Producers `push` an input and receive an [`EntryHandle`]; re-renders
//!    `patch` it, teardown `dispose`s it.
//!
//! 2. Every mutation that changes observable input bumps the revision and
//!    notifies change listeners (the DOM scheduler subscribes here).
//!
//! 3. `resolve` recomputes the head only when the revision moved; for a
//!    fixed revision the cached value is returned unchanged.
//!
//! Cloning a `HeadStore` shares state: clones address the same head.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::entry::{Entry, EntryId, EntryMode, ScopeId};
use super::handle::EntryHandle;
use super::input::HeadInput;
use crate::resolve::{self, ResolvedHead};
use crate::script::loader::ScriptLoader;

/// Options for [`HeadStore::push_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PushOptions {
    /// How the entry's input is interpreted.
    pub mode: EntryMode,

    /// Logical producer identity. Pushing again with the same scope while
    /// the previous entry is active patches it instead of creating a
    /// duplicate.
    pub scope: Option<ScopeId>,
}

/// The single logical document head.
#[derive(Debug, Clone)]
pub struct HeadStore {
    inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    /// Active entries in push order.
    entries: RwLock<IndexMap<EntryId, Entry>>,

    /// Bumped on every observable mutation.
    revision: AtomicU64,

    /// Scope-keyed lookup for idempotent entry creation.
    scopes: Mutex<HashMap<ScopeId, EntryId>>,

    /// Change listeners, notified with the new revision after each bump.
    listeners: RwLock<Vec<(u64, Box<dyn Fn(u64) + Send + Sync>)>>,
    listener_seq: AtomicU64,

    /// Resolved head memoized for the current revision.
    resolved: Mutex<Option<ResolvedHead>>,

    /// Script loaders shared by source key. Retained for the lifetime of
    /// the store even after every referencing producer disposes; reloading
    /// a script is expensive.
    pub(crate) scripts: DashMap<String, Arc<ScriptLoader>>,
}

impl std::fmt::Debug for StoreInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreInner")
            .field("entries", &self.entries.read().len())
            .field("revision", &self.revision.load(Ordering::SeqCst))
            .field("scripts", &self.scripts.len())
            .finish()
    }
}

impl HeadStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                entries: RwLock::new(IndexMap::new()),
                revision: AtomicU64::new(0),
                scopes: Mutex::new(HashMap::new()),
                listeners: RwLock::new(Vec::new()),
                listener_seq: AtomicU64::new(0),
                resolved: Mutex::new(None),
                scripts: DashMap::new(),
            }),
        }
    }

    /// Create a store pre-populated with fallback entries.
    ///
    /// Init entries are ordinary entries pushed before any producer, so
    /// they lose every conflict while a producer is active and win again
    /// once it disposes.
    pub fn with_init<I>(inputs: I) -> Self
    where
        I: IntoIterator<Item = HeadInput>,
    {
        let store = Self::new();
        for input in inputs {
            store.push(input);
        }
        store
    }

    pub(crate) fn from_inner(inner: Arc<StoreInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Arc<StoreInner> {
        &self.inner
    }

    /// Push a new entry. Never fails; malformed input surfaces at
    /// resolution time, not here.
    pub fn push(&self, input: HeadInput) -> EntryHandle {
        self.push_with(input, PushOptions::default())
    }

    /// Push a new entry with explicit options.
    pub fn push_with(&self, input: HeadInput, options: PushOptions) -> EntryHandle {
        if let Some(scope) = options.scope {
            let existing = self.inner.scopes.lock().get(&scope).copied();
            if let Some(id) = existing {
                if self.inner.contains(id) {
                    // At-least-once creation for the same producer: patch
                    // the live entry and hand back its identity.
                    self.inner.patch(id, input);
                    return EntryHandle::new(&self.inner, id);
                }
            }
        }

        let id = EntryId::new();
        debug!(entry = id.raw(), "push head entry");
        self.inner
            .entries
            .write()
            .insert(id, Entry::new(id, input, options.mode));
        if let Some(scope) = options.scope {
            self.inner.scopes.lock().insert(scope, id);
        }
        self.inner.touch();
        EntryHandle::new(&self.inner, id)
    }

    /// Current revision. Strictly increases with every observable mutation.
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::SeqCst)
    }

    /// Number of active entries.
    pub fn entry_count(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Resolve the current entries into a head.
    ///
    /// Idempotent per revision: repeated calls without an intervening
    /// mutation return the identical cached value.
    pub fn resolve(&self) -> ResolvedHead {
        let revision = self.revision();
        {
            let cached = self.inner.resolved.lock();
            if let Some(head) = cached.as_ref() {
                if head.revision == revision {
                    return head.clone();
                }
            }
        }

        let mut entries = self.inner.entries.write();
        let head = resolve::resolve(entries.values_mut(), revision);
        drop(entries);

        *self.inner.resolved.lock() = Some(head.clone());
        head
    }

    /// Register a change listener, invoked with the new revision after
    /// every mutation. Dropping the returned guard unregisters it.
    pub fn on_change<F>(&self, listener: F) -> ChangeListener
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        let id = self.inner.listener_seq.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .write()
            .push((id, Box::new(listener)));
        ChangeListener {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }
}

impl Default for HeadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreInner {
    pub(crate) fn contains(&self, id: EntryId) -> bool {
        self.entries.read().contains_key(&id)
    }

    pub(crate) fn patch(&self, id: EntryId, input: HeadInput) {
        let patched = {
            let mut entries = self.entries.write();
            match entries.get_mut(&id) {
                Some(entry) => {
                    entry.replace_input(input);
                    true
                }
                None => false,
            }
        };
        if patched {
            debug!(entry = id.raw(), "patch head entry");
            self.touch();
        } else {
            // Disposed-handle misuse is silently ignored.
            debug!(entry = id.raw(), "patch on disposed entry ignored");
        }
    }

    pub(crate) fn dispose(&self, id: EntryId) {
        let removed = self.entries.write().shift_remove(&id).is_some();
        if removed {
            self.scopes.lock().retain(|_, entry| *entry != id);
            debug!(entry = id.raw(), "dispose head entry");
            self.touch();
        }
    }

    pub(crate) fn poll(&self, id: EntryId, remove_if_empty: bool) {
        enum Outcome {
            Missing,
            Remove,
            Invalidated,
        }
        let outcome = {
            let mut entries = self.entries.write();
            match entries.get_mut(&id) {
                None => Outcome::Missing,
                Some(entry) if remove_if_empty && entry.input().is_empty() => Outcome::Remove,
                Some(entry) => {
                    entry.invalidate();
                    Outcome::Invalidated
                }
            }
        };
        match outcome {
            Outcome::Missing => {}
            Outcome::Remove => self.dispose(id),
            Outcome::Invalidated => {
                self.touch();
            }
        }
    }

    /// Bump the revision, drop the memoized head, notify listeners.
    pub(crate) fn touch(&self) -> u64 {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        *self.resolved.lock() = None;
        let listeners = self.listeners.read();
        for (_, listener) in listeners.iter() {
            listener(revision);
        }
        revision
    }

    fn remove_listener(&self, id: u64) {
        self.listeners.write().retain(|(lid, _)| *lid != id);
    }
}

/// Guard for a registered change listener.
///
/// Dropping this guard unregisters the listener.
pub struct ChangeListener {
    store: Weak<StoreInner>,
    id: u64,
}

impl Drop for ChangeListener {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.remove_listener(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn push_assigns_increasing_ids() {
        let store = HeadStore::new();
        let a = store.push(HeadInput::titled("a"));
        let b = store.push(HeadInput::titled("b"));
        assert!(a.id() < b.id());
        assert_eq!(store.entry_count(), 2);
    }

    #[test]
    fn every_mutation_bumps_revision() {
        let store = HeadStore::new();
        let rev0 = store.revision();

        let handle = store.push(HeadInput::titled("a"));
        let rev1 = store.revision();
        assert!(rev1 > rev0);

        handle.patch(HeadInput::titled("b"));
        let rev2 = store.revision();
        assert!(rev2 > rev1);

        handle.dispose();
        assert!(store.revision() > rev2);
    }

    #[test]
    fn dispose_is_idempotent() {
        let store = HeadStore::new();
        let handle = store.push(HeadInput::titled("a"));

        handle.dispose();
        let revision = store.revision();

        // Racing disposals are no-ops, not errors, and do not mark dirty.
        handle.dispose();
        handle.dispose();
        assert_eq!(store.revision(), revision);
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn patch_after_dispose_is_ignored() {
        let store = HeadStore::new();
        let handle = store.push(HeadInput::titled("a"));
        handle.dispose();

        let revision = store.revision();
        handle.patch(HeadInput::titled("b"));
        assert_eq!(store.revision(), revision);
        assert_eq!(store.resolve().title(), None);
    }

    #[test]
    fn resolve_is_memoized_per_revision() {
        let store = HeadStore::new();
        store.push(HeadInput::titled("a"));

        let first = store.resolve();
        let second = store.resolve();
        assert_eq!(first, second);

        store.push(HeadInput::titled("b"));
        let third = store.resolve();
        assert_eq!(third.title(), Some("b"));
        assert!(third.revision > first.revision);
    }

    #[test]
    fn scoped_push_is_idempotent() {
        let store = HeadStore::new();
        let scope = ScopeId::new();

        let first = store.push_with(
            HeadInput::titled("one"),
            PushOptions {
                scope: Some(scope),
                ..Default::default()
            },
        );
        // A double-invoked lifecycle hook pushes again for the same scope.
        let second = store.push_with(
            HeadInput::titled("two"),
            PushOptions {
                scope: Some(scope),
                ..Default::default()
            },
        );

        assert_eq!(first.id(), second.id());
        assert_eq!(store.entry_count(), 1);
        assert_eq!(store.resolve().title(), Some("two"));

        // After dispose, the same scope creates a fresh entry.
        second.dispose();
        let third = store.push_with(
            HeadInput::titled("three"),
            PushOptions {
                scope: Some(scope),
                ..Default::default()
            },
        );
        assert_ne!(third.id(), first.id());
        assert_eq!(store.entry_count(), 1);
    }

    #[test]
    fn poll_removes_empty_entries_on_request() {
        let store = HeadStore::new();
        let handle = store.push(HeadInput::default());
        assert_eq!(store.entry_count(), 1);

        handle.poll(false);
        assert_eq!(store.entry_count(), 1);

        handle.poll(true);
        assert_eq!(store.entry_count(), 0);

        // Safe after dispose.
        handle.poll(true);
    }

    #[test]
    fn change_listeners_fire_until_dropped() {
        let store = HeadStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let guard = store.on_change(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.push(HeadInput::titled("a"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        drop(guard);
        store.push(HeadInput::titled("b"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handles_survive_store_drop() {
        let handle = {
            let store = HeadStore::new();
            store.push(HeadInput::titled("a"))
        };
        // Store is gone; all handle operations are inert.
        assert!(!handle.is_active());
        handle.patch(HeadInput::titled("b"));
        handle.dispose();
    }
}
