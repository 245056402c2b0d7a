//! DOM Reconciliation
//!
//! Applies a resolved head to a live document with minimal mutation.
//!
//! # Concepts
//!
//! ## The boundary
//!
//! Concrete documents sit behind the [`HeadDom`] trait; the reconciler is
//! pure bookkeeping above it. [`VirtualDocument`] is the in-memory
//! implementation used by tests and headless embedders.
//!
//! ## Diffing
//!
//! The [`Reconciler`] keys every element it creates by tag identity. Diffs
//! insert what is new, remove what vanished, and patch in place what
//! persists, so unchanged stylesheets and scripts are never re-executed.
//! Title and root attributes are applied as property sets. Foreign nodes
//! and attributes are never touched.
//!
//! ## Scheduling
//!
//! The [`Scheduler`] coalesces bursts of store mutations into a single
//! debounced resolve-and-apply pass that always converges on the latest
//! revision.

mod document;
mod reconcile;
mod scheduler;
mod virtual_dom;

pub use document::{AttrTarget, DomError, ElementId, HeadDom};
pub use reconcile::{render_dom_head, DomRenderer, Reconciler};
pub use scheduler::{Scheduler, DEFAULT_DEBOUNCE};
pub use virtual_dom::{VirtualDocument, VirtualElement};
