//! Head Resolution
//!
//! This module turns the ordered set of active entries into the canonical
//! tag list. It owns the tag model, the dedupe-key rule table, the merge
//! rules, safe-mode sanitization, and SEO flat-meta expansion.
//!
//! Resolution is pure: for a fixed store revision the output is
//! byte-identical across calls. All conflict handling is last-write-wins in
//! push order, with two deliberate exceptions (same-entry fragment merging
//! and cross-entry structured payload accumulation) documented on
//! [`resolve`].

mod merge;
mod resolver;
mod sanitize;
mod seo;
pub mod tag;

pub use merge::{deep_merge, merge_attr_bag, merge_props};
pub use resolver::{resolve, ResolvedHead, JSON_PAYLOAD_PROP};
pub use seo::expand_flat_meta;
pub use tag::{Tag, TagName, TagPosition};

pub(crate) use resolver::flatten_entry;
