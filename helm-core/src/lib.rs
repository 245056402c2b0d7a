//! Helm Core
//!
//! This crate provides the document head manager for the Helm reactive UI
//! framework. It implements:
//!
//! - An entry store with a push/patch/dispose lifecycle for head producers
//! - Resolution and deduplication of entries into one canonical tag set
//! - DOM reconciliation that applies resolved heads with minimal mutation
//! - Server-side serialization and HTML template injection
//! - A trigger-gated script loading state machine
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `store`: Entries, handles, and the revisioned head store
//! - `resolve`: The tag model and the pure resolution algorithm
//! - `dom`: The document boundary, reconciler, and debounced scheduler
//! - `ssr`: Head serialization and template injection
//! - `script`: Shared script loaders, triggers, and callbacks
//!
//! # Example
//!
//! ```rust,ignore
//! use helm_core::{HeadStore, HeadInput};
//! use helm_core::ssr::render_ssr_head;
//!
//! let head = HeadStore::new();
//!
//! // A layout contributes defaults; a page overrides them.
//! head.push(HeadInput::titled("My Site"));
//! let page = head.push(HeadInput::titled("Docs"));
//!
//! let out = render_ssr_head(&head);
//! assert!(out.head_tags.contains("<title>Docs</title>"));
//!
//! // When the page unmounts, the layout's title wins again.
//! page.dispose();
//! assert!(render_ssr_head(&head).head_tags.contains("<title>My Site</title>"));
//! ```

pub mod dom;
pub mod resolve;
pub mod script;
pub mod ssr;
pub mod store;

pub use resolve::{ResolvedHead, Tag, TagName, TagPosition};
pub use store::{
    props, EntryHandle, EntryMode, HeadInput, HeadStore, PushOptions, ScopeId, TagInput, TagProps,
};
