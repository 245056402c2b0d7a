//! Entry handles.
//!
//! An [`EntryHandle`] is the producer's stable proxy to its entry. Handles
//! stay valid (and silently inert) after the entry is disposed or the store
//! is dropped, so lifecycle hooks that race to patch or dispose can never
//! fail. Cloning a handle shares identity: both clones address the same
//! entry.

use std::sync::{Arc, Weak};

use super::input::HeadInput;
use super::store::StoreInner;
use super::EntryId;

/// Handle to an active head entry.
#[derive(Debug, Clone)]
pub struct EntryHandle {
    store: Weak<StoreInner>,
    id: EntryId,
}

impl EntryHandle {
    pub(crate) fn new(store: &Arc<StoreInner>, id: EntryId) -> Self {
        Self {
            store: Arc::downgrade(store),
            id,
        }
    }

    /// The entry this handle addresses.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Replace the entry's input atomically.
    ///
    /// A no-op if the entry was already disposed or the store is gone.
    pub fn patch(&self, input: HeadInput) {
        if let Some(store) = self.store.upgrade() {
            store.patch(self.id, input);
        }
    }

    /// Remove the entry from the store.
    ///
    /// Idempotent: disposing twice, or after the store is gone, is a no-op.
    /// Producers may race to dispose without coordination.
    pub fn dispose(&self) {
        if let Some(store) = self.store.upgrade() {
            store.dispose(self.id);
        }
    }

    /// Re-evaluate the entry's derived tags.
    ///
    /// Used by framework adapters to coalesce rapid re-renders. With
    /// `remove_if_empty`, an entry whose input contributes nothing is
    /// disposed. Safe to call after dispose.
    pub fn poll(&self, remove_if_empty: bool) {
        if let Some(store) = self.store.upgrade() {
            store.poll(self.id, remove_if_empty);
        }
    }

    /// Whether the entry is still present in the store.
    pub fn is_active(&self) -> bool {
        self.store
            .upgrade()
            .map(|store| store.contains(self.id))
            .unwrap_or(false)
    }
}
