use std::collections::HashMap;

use crate::attributes::{is_special, special_key, AttrValue, SPECIAL_ATTRIBUTES};
use crate::request::{AttributeNames, HttpRequest};

/// Per-layer isolation of the ten reserved dispatch attributes.
///
/// A layer keeps a snapshot of what its inner request exposed for each key
/// when the layer was created, plus an overlay of values written through the
/// layer since. While the inner value still equals the snapshot the overlay
/// is authoritative. Once an inner layer changes a key, the inner value wins
/// and this layer's overlay is stale for that key.
///
/// Every other attribute name goes straight to the inner request.
#[derive(Debug, Default)]
pub(crate) struct IsolatedAttributes {
    snapshot: HashMap<&'static str, AttrValue>,
    overlay: HashMap<&'static str, AttrValue>,
}

impl IsolatedAttributes {
    pub(crate) fn capture(inner: &dyn HttpRequest) -> Self {
        let snapshot = SPECIAL_ATTRIBUTES
            .iter()
            .filter_map(|key| {
                inner
                    .attribute(key)
                    .filter(|v| !v.is_null())
                    .map(|v| (*key, v))
            })
            .collect();
        Self {
            snapshot,
            overlay: HashMap::new(),
        }
    }

    /// True when an inner layer changed `key` after this layer was created.
    fn inner_override(&self, key: &'static str, live: Option<&AttrValue>) -> bool {
        live != self.snapshot.get(key)
    }

    pub(crate) fn get(&self, inner: &dyn HttpRequest, name: &str) -> Option<AttrValue> {
        let Some(key) = special_key(name) else {
            return inner.attribute(name);
        };
        let live = inner.attribute(key);
        if self.inner_override(key, live.as_ref()) {
            return live;
        }
        self.overlay.get(key).cloned()
    }

    pub(crate) fn set(&mut self, inner: &mut dyn HttpRequest, name: &str, value: AttrValue) {
        let Some(key) = special_key(name) else {
            inner.set_attribute(name, value);
            return;
        };
        self.clear_inner_override(inner, key);
        if value.is_null() {
            self.overlay.remove(key);
        } else {
            self.overlay.insert(key, value);
        }
    }

    pub(crate) fn remove(&mut self, inner: &mut dyn HttpRequest, name: &str) {
        let Some(key) = special_key(name) else {
            inner.remove_attribute(name);
            return;
        };
        self.clear_inner_override(inner, key);
        self.overlay.remove(key);
    }

    /// Drop an inner layer's value for `key` so writes through this layer
    /// become visible again.
    fn clear_inner_override(&self, inner: &mut dyn HttpRequest, key: &'static str) {
        let live = inner.attribute(key);
        if self.inner_override(key, live.as_ref()) {
            inner.remove_attribute(key);
        }
    }

    /// Reserved keys with a visible value, then the inner request's own
    /// names. Produced lazily.
    pub(crate) fn names<'a>(&'a self, inner: &'a dyn HttpRequest) -> AttributeNames<'a> {
        let specials = SPECIAL_ATTRIBUTES
            .iter()
            .filter(move |key| self.get(inner, key).is_some_and(|v| !v.is_null()))
            .map(|key| key.to_string());
        let others = inner.attribute_names().filter(|name| !is_special(name));
        Box::new(specials.chain(others))
    }
}
