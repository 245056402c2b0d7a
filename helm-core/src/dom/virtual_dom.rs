//! In-memory document.
//!
//! A [`VirtualDocument`] implements [`HeadDom`] over plain collections. It
//! backs the test suite and headless embedders, and counts every write so
//! idempotency ("applying an unchanged head performs zero writes") is
//! directly observable.

use std::collections::BTreeMap;

use crate::resolve::TagPosition;
use crate::ssr::MARKER_ATTR;

use super::document::{AttrTarget, DomError, ElementId, HeadDom};

/// One element created through the [`HeadDom`] surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualElement {
    pub id: ElementId,
    pub tag_name: String,
    pub position: TagPosition,
    pub attrs: BTreeMap<String, String>,
    pub text: Option<String>,
}

/// An in-memory head/body document.
#[derive(Debug, Default)]
pub struct VirtualDocument {
    next_id: u64,
    title: String,
    html_attrs: BTreeMap<String, String>,
    body_attrs: BTreeMap<String, String>,
    elements: Vec<VirtualElement>,
    writes: usize,
}

impl VirtualDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current document title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Attribute on the html or body element.
    pub fn attr(&self, target: AttrTarget, name: &str) -> Option<&str> {
        let bag = match target {
            AttrTarget::Html => &self.html_attrs,
            AttrTarget::Body => &self.body_attrs,
        };
        bag.get(name).map(String::as_str)
    }

    /// All elements, in creation order.
    pub fn elements(&self) -> &[VirtualElement] {
        &self.elements
    }

    /// Elements at one position, in creation order.
    pub fn elements_at(&self, position: TagPosition) -> impl Iterator<Item = &VirtualElement> {
        self.elements.iter().filter(move |e| e.position == position)
    }

    /// Find an element by its dedupe marker.
    pub fn find_by_marker(&self, marker: &str) -> Option<&VirtualElement> {
        self.elements
            .iter()
            .find(|e| e.attrs.get(MARKER_ATTR).map(String::as_str) == Some(marker))
    }

    /// Find an element by handle.
    pub fn element(&self, id: ElementId) -> Option<&VirtualElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Total mutations applied since creation.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut VirtualElement, DomError> {
        self.elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(DomError::UnknownElement(id.0))
    }
}

impl HeadDom for VirtualDocument {
    fn set_title(&mut self, text: &str) -> Result<(), DomError> {
        self.title = text.to_string();
        self.writes += 1;
        Ok(())
    }

    fn set_attr(&mut self, target: AttrTarget, name: &str, value: &str) -> Result<(), DomError> {
        let bag = match target {
            AttrTarget::Html => &mut self.html_attrs,
            AttrTarget::Body => &mut self.body_attrs,
        };
        bag.insert(name.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove_attr(&mut self, target: AttrTarget, name: &str) -> Result<(), DomError> {
        let bag = match target {
            AttrTarget::Html => &mut self.html_attrs,
            AttrTarget::Body => &mut self.body_attrs,
        };
        bag.remove(name);
        self.writes += 1;
        Ok(())
    }

    fn create_element(
        &mut self,
        position: TagPosition,
        tag_name: &str,
        marker: Option<&str>,
    ) -> Result<ElementId, DomError> {
        let id = ElementId(self.next_id);
        self.next_id += 1;

        let mut attrs = BTreeMap::new();
        if let Some(marker) = marker {
            attrs.insert(MARKER_ATTR.to_string(), marker.to_string());
        }
        self.elements.push(VirtualElement {
            id,
            tag_name: tag_name.to_string(),
            position,
            attrs,
            text: None,
        });
        self.writes += 1;
        Ok(id)
    }

    fn set_element_attr(
        &mut self,
        element: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        let el = self.element_mut(element)?;
        el.attrs.insert(name.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove_element_attr(&mut self, element: ElementId, name: &str) -> Result<(), DomError> {
        let el = self.element_mut(element)?;
        el.attrs.remove(name);
        self.writes += 1;
        Ok(())
    }

    fn set_element_text(&mut self, element: ElementId, text: &str) -> Result<(), DomError> {
        let el = self.element_mut(element)?;
        el.text = Some(text.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove_element(&mut self, element: ElementId) -> Result<(), DomError> {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != element);
        if self.elements.len() == before {
            return Err(DomError::UnknownElement(element.0));
        }
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_mutate_elements() {
        let mut dom = VirtualDocument::new();
        let id = dom
            .create_element(TagPosition::Head, "meta", Some("k"))
            .expect("create");

        dom.set_element_attr(id, "name", "description").expect("attr");
        dom.set_element_text(id, "x").expect("text");

        let el = dom.element(id).expect("element");
        assert_eq!(el.tag_name, "meta");
        assert_eq!(el.attrs.get("name").map(String::as_str), Some("description"));
        assert_eq!(el.text.as_deref(), Some("x"));
        assert!(dom.find_by_marker("k").is_some());

        dom.remove_element(id).expect("remove");
        assert!(dom.element(id).is_none());
        assert_eq!(
            dom.remove_element(id),
            Err(DomError::UnknownElement(id.0))
        );
    }

    #[test]
    fn counts_writes() {
        let mut dom = VirtualDocument::new();
        assert_eq!(dom.write_count(), 0);
        dom.set_title("t").expect("title");
        dom.set_attr(AttrTarget::Html, "lang", "en").expect("attr");
        assert_eq!(dom.write_count(), 2);
    }
}
