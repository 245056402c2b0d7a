//! Entry Store
//!
//! This module implements the head's source of truth: the ordered collection
//! of active entries, each one producer's raw contribution with a
//! patch/dispose lifecycle.
//!
//! # Concepts
//!
//! ## Entries
//!
//! An Entry is created by `push`, mutated only through `patch`, and removed
//! by `dispose`. Iteration order is push order, which doubles as resolution
//! precedence: later pushes win ties.
//!
//! ## Handles
//!
//! Producers never hold entries directly; they hold an [`EntryHandle`],
//! a stable proxy that stays safe to use after disposal. Handle misuse is
//! silently ignored so racing lifecycle hooks cannot fail.
//!
//! ## Revisions
//!
//! Every observable mutation bumps the store revision. Resolution is
//! memoized against it, and change listeners receive it so a scheduler can
//! coalesce bursts of mutations into one resolve-and-apply pass.

pub mod entry;
pub mod handle;
pub mod input;
mod store;

pub use entry::{Entry, EntryId, EntryMode, ScopeId};
pub use handle::EntryHandle;
pub use input::{props, HeadInput, TagInput, TagProps};
pub use store::{ChangeListener, HeadStore, PushOptions};

pub(crate) use store::StoreInner;
