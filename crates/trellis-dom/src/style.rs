//! Property maps carried by nodes.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use trellis_value::DomValue;

/// String-keyed property map used for style, extension and diff properties.
///
/// Values are reference-counted so copying a map out of a node is cheap.
pub type StyleMap = HashMap<String, Arc<DomValue>>;

/// Properties changed since the render-sync step last consumed them.
///
/// The node only accumulates changes; the consumer decides when they are
/// committed by calling [`PendingDiff::take_and_clear`].
#[derive(Debug, Clone, Default)]
pub struct PendingDiff {
    changes: StyleMap,
}

impl PendingDiff {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of pending keys.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Copy of the pending changes, leaving the buffer untouched.
    pub fn snapshot(&self) -> StyleMap {
        self.changes.clone()
    }

    /// Replace the pending changes wholesale.
    pub fn replace(&mut self, changes: StyleMap) {
        self.changes = changes;
    }

    /// Merge changes into the buffer; later values win per key.
    pub fn merge(&mut self, changes: &StyleMap) {
        for (key, value) in changes {
            self.changes.insert(key.clone(), Arc::clone(value));
        }
    }

    /// Drain the buffer, returning everything that was pending.
    pub fn take_and_clear(&mut self) -> StyleMap {
        mem::take(&mut self.changes)
    }
}

/// Apply `changes` onto `target`. A [`DomValue::Null`] value removes the key.
pub(crate) fn merge_style(target: &mut StyleMap, changes: &StyleMap) {
    for (key, value) in changes {
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.clone(), Arc::clone(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, DomValue)]) -> StyleMap {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), Arc::new(value.clone())))
            .collect()
    }

    #[test]
    fn test_take_and_clear_drains() {
        let mut diff = PendingDiff::new();
        diff.merge(&map(&[("width", DomValue::from(10))]));
        diff.merge(&map(&[("width", DomValue::from(20)), ("color", DomValue::from("red"))]));

        assert_eq!(diff.len(), 2);
        let taken = diff.take_and_clear();
        assert_eq!(taken.get("width").and_then(|v| v.as_f64()), Some(20.0));
        assert!(diff.is_empty());
        assert!(diff.take_and_clear().is_empty());
    }

    #[test]
    fn test_replace_discards_previous() {
        let mut diff = PendingDiff::new();
        diff.merge(&map(&[("a", DomValue::from(1))]));
        diff.replace(map(&[("b", DomValue::from(2))]));
        let snapshot = diff.snapshot();
        assert!(!snapshot.contains_key("a"));
        assert!(snapshot.contains_key("b"));
        assert_eq!(diff.len(), 1);
    }

    #[test]
    fn test_merge_style_null_removes() {
        let mut style = map(&[("a", DomValue::from(1)), ("b", DomValue::from(2))]);
        merge_style(&mut style, &map(&[("a", DomValue::Null), ("c", DomValue::from(3))]));
        assert!(!style.contains_key("a"));
        assert!(style.contains_key("b"));
        assert!(style.contains_key("c"));
    }
}
