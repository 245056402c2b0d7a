//! Head-to-DOM reconciliation.
//!
//! The reconciler diffs the previously applied [`ResolvedHead`] against a
//! new one and applies the minimal mutation set: new tags are inserted,
//! vanished tags removed, and tags whose key persists but whose content
//! changed are patched in place, never recreated, so stylesheets and
//! scripts are not re-executed and the head never flickers.
//!
//! The pass runs to completion synchronously. A failing mutation is logged
//! and skipped for that tag only; everything else still applies, leaving
//! the document reflecting as much of the new head as possible. Elements
//! the reconciler did not create are never touched.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::resolve::tag::{prop_is_rendered, prop_to_string};
use crate::resolve::{ResolvedHead, Tag, TagName};
use crate::store::{HeadStore, TagProps};

use super::document::{AttrTarget, ElementId, HeadDom};

/// Stateful diff/apply engine for one document.
#[derive(Debug, Default)]
pub struct Reconciler {
    /// The head applied by the previous pass.
    applied: Option<ResolvedHead>,

    /// Elements created by this reconciler, keyed by tag identity.
    nodes: HashMap<String, ElementId>,

    /// Title applied by the previous pass.
    title: Option<String>,

    /// Root attributes applied by the previous pass, in rendered form.
    html_attrs: BTreeMap<String, String>,
    body_attrs: BTreeMap<String, String>,
}

/// Attributes of a tag in rendered (string) form.
fn rendered_attrs(props: &TagProps) -> BTreeMap<String, String> {
    props
        .iter()
        .filter(|(_, v)| prop_is_rendered(v))
        .map(|(k, v)| (k.clone(), prop_to_string(v)))
        .collect()
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity keys of the elements currently tracked.
    pub fn tracked(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Apply a resolved head to the document.
    ///
    /// Re-applying the head the previous pass applied performs zero
    /// writes.
    pub fn apply<D: HeadDom>(&mut self, dom: &mut D, next: &ResolvedHead) {
        if self.applied.as_ref() == Some(next) {
            return;
        }

        self.apply_title(dom, next);
        self.apply_attr_bag(dom, AttrTarget::Html, &next.html_attrs);
        self.apply_attr_bag(dom, AttrTarget::Body, &next.body_attrs);
        self.apply_tags(dom, next);

        self.applied = Some(next.clone());
    }

    fn apply_title<D: HeadDom>(&mut self, dom: &mut D, next: &ResolvedHead) {
        let next_title = next.title().map(str::to_string);
        if next_title == self.title {
            return;
        }
        let text = next_title.clone().unwrap_or_default();
        if let Err(err) = dom.set_title(&text) {
            warn!(%err, "failed to set document title");
            return;
        }
        self.title = next_title;
    }

    fn apply_attr_bag<D: HeadDom>(&mut self, dom: &mut D, target: AttrTarget, next: &TagProps) {
        let next = rendered_attrs(next);
        let prev = match target {
            AttrTarget::Html => &mut self.html_attrs,
            AttrTarget::Body => &mut self.body_attrs,
        };

        // Remove attributes this reconciler set that are gone now. Foreign
        // attributes were never in `prev`, so they survive untouched.
        let stale: Vec<String> = prev
            .keys()
            .filter(|k| !next.contains_key(*k))
            .cloned()
            .collect();
        for name in stale {
            if let Err(err) = dom.remove_attr(target, &name) {
                warn!(%err, attr = %name, "failed to remove root attribute");
            }
            prev.remove(&name);
        }

        for (name, value) in &next {
            if prev.get(name) == Some(value) {
                continue;
            }
            if let Err(err) = dom.set_attr(target, name, value) {
                warn!(%err, attr = %name, "failed to set root attribute");
                continue;
            }
            prev.insert(name.clone(), value.clone());
        }
    }

    fn apply_tags<D: HeadDom>(&mut self, dom: &mut D, next: &ResolvedHead) {
        // Title is applied as a property set, not node insertion.
        let next_tags: Vec<(String, &Tag)> = next
            .tags
            .iter()
            .filter(|t| t.name != TagName::Title)
            .map(|t| (t.hash(), t))
            .collect();

        // Owned snapshot so element creation below can borrow self freely.
        let old_tags: HashMap<String, Tag> = self
            .applied
            .as_ref()
            .map(|head| {
                head.tags
                    .iter()
                    .filter(|t| t.name != TagName::Title)
                    .map(|t| (t.hash(), t.clone()))
                    .collect()
            })
            .unwrap_or_default();

        // Remove elements whose tag vanished.
        let next_keys: HashMap<&str, ()> =
            next_tags.iter().map(|(k, _)| (k.as_str(), ())).collect();
        let vanished: Vec<String> = self
            .nodes
            .keys()
            .filter(|k| !next_keys.contains_key(k.as_str()))
            .cloned()
            .collect();
        for key in vanished {
            if let Some(id) = self.nodes.remove(&key) {
                if let Err(err) = dom.remove_element(id) {
                    warn!(%err, tag = %key, "failed to remove head element");
                }
            }
        }

        for (key, tag) in next_tags {
            match (self.nodes.get(&key).copied(), old_tags.get(&key)) {
                (Some(id), Some(old)) if old.position == tag.position => {
                    self.patch_element(dom, id, old, tag);
                }
                (Some(id), _) => {
                    // Position moved (or the old tag is unknown): recreate.
                    if let Err(err) = dom.remove_element(id) {
                        warn!(%err, tag = %key, "failed to remove relocated element");
                    }
                    self.nodes.remove(&key);
                    self.create_element(dom, &key, tag);
                }
                (None, _) => {
                    self.create_element(dom, &key, tag);
                }
            }
        }
    }

    fn create_element<D: HeadDom>(&mut self, dom: &mut D, key: &str, tag: &Tag) {
        let marker = tag.marker();
        let id = match dom.create_element(tag.position, tag.name.as_str(), marker.as_deref()) {
            Ok(id) => id,
            Err(err) => {
                // Contained: this tag is skipped, the rest still applies.
                warn!(%err, tag = %tag.name, "failed to create head element");
                return;
            }
        };

        for (name, value) in rendered_attrs(&tag.props) {
            if let Err(err) = dom.set_element_attr(id, &name, &value) {
                warn!(%err, tag = %tag.name, attr = %name, "failed to set attribute");
            }
        }
        if let Some(text) = &tag.text_content {
            if let Err(err) = dom.set_element_text(id, text) {
                warn!(%err, tag = %tag.name, "failed to set text content");
            }
        }

        self.nodes.insert(key.to_string(), id);
    }

    /// Patch an element in place: only attributes that actually changed are
    /// written.
    fn patch_element<D: HeadDom>(&mut self, dom: &mut D, id: ElementId, old: &Tag, new: &Tag) {
        let old_attrs = rendered_attrs(&old.props);
        let new_attrs = rendered_attrs(&new.props);

        for name in old_attrs.keys() {
            if !new_attrs.contains_key(name) {
                if let Err(err) = dom.remove_element_attr(id, name) {
                    warn!(%err, attr = %name, "failed to remove attribute");
                }
            }
        }
        for (name, value) in &new_attrs {
            if old_attrs.get(name) == Some(value) {
                continue;
            }
            if let Err(err) = dom.set_element_attr(id, name, value) {
                warn!(%err, attr = %name, "failed to set attribute");
            }
        }

        if old.text_content != new.text_content {
            let text = new.text_content.clone().unwrap_or_default();
            if let Err(err) = dom.set_element_text(id, &text) {
                warn!(%err, "failed to set text content");
            }
        }
    }
}

/// A document paired with its reconciler state.
#[derive(Debug)]
pub struct DomRenderer<D: HeadDom> {
    dom: D,
    reconciler: Reconciler,
}

impl<D: HeadDom> DomRenderer<D> {
    pub fn new(dom: D) -> Self {
        Self {
            dom,
            reconciler: Reconciler::new(),
        }
    }

    /// Resolve the store and reconcile the document against the result.
    pub fn render(&mut self, store: &HeadStore) {
        let head = store.resolve();
        self.reconciler.apply(&mut self.dom, &head);
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn into_dom(self) -> D {
        self.dom
    }
}

/// Perform one reconcile pass against the given renderer.
///
/// Idempotent: calling it twice with no intervening store mutation
/// performs zero additional document writes.
pub fn render_dom_head<D: HeadDom>(store: &HeadStore, renderer: &mut DomRenderer<D>) {
    renderer.render(store);
}
