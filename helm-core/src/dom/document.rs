//! The document boundary.
//!
//! The reconciler never touches a concrete DOM; it speaks through
//! [`HeadDom`], a small fallible mutation surface an embedder implements
//! for its document type (a browser binding, a test double, a headless
//! renderer). Everything above this trait is pure bookkeeping.

use thiserror::Error;

use crate::resolve::TagPosition;

/// Failure applying one mutation to a document.
///
/// Reconciliation treats these as per-tag events: the failing tag is
/// logged and skipped, the rest of the pass still applies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The document cannot host this element kind.
    #[error("unsupported tag <{0}> in this document")]
    UnsupportedTag(String),

    /// The referenced element no longer exists.
    #[error("unknown element #{0}")]
    UnknownElement(u64),
}

/// Opaque handle to an element the document created for the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// Which attribute bag a root-level attribute write addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrTarget {
    /// The root `<html>` element.
    Html,

    /// The `<body>` element.
    Body,
}

/// Mutation surface of a live document.
///
/// Implementations must only ever be driven by one reconciler; the
/// reconciler guarantees it only removes or patches elements it created
/// through this trait, leaving foreign nodes untouched.
pub trait HeadDom {
    /// Set the document title. An empty string clears it.
    fn set_title(&mut self, text: &str) -> Result<(), DomError>;

    /// Set an attribute on the html or body element.
    fn set_attr(&mut self, target: AttrTarget, name: &str, value: &str) -> Result<(), DomError>;

    /// Remove an attribute from the html or body element.
    fn remove_attr(&mut self, target: AttrTarget, name: &str) -> Result<(), DomError>;

    /// Create an empty element at the given position and return its handle.
    /// `marker` carries the tag's dedupe identity into the document.
    fn create_element(
        &mut self,
        position: TagPosition,
        tag_name: &str,
        marker: Option<&str>,
    ) -> Result<ElementId, DomError>;

    /// Set an attribute on an element this trait created.
    fn set_element_attr(
        &mut self,
        element: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError>;

    /// Remove an attribute from an element this trait created.
    fn remove_element_attr(&mut self, element: ElementId, name: &str) -> Result<(), DomError>;

    /// Replace an element's text content.
    fn set_element_text(&mut self, element: ElementId, text: &str) -> Result<(), DomError>;

    /// Remove an element this trait created.
    fn remove_element(&mut self, element: ElementId) -> Result<(), DomError>;
}
