//! Named callbacks for remote function calls.
//!
//! A node asks the outside world to run a named function and gets the answer
//! back asynchronously through a separate channel. The answer is correlated
//! to its receiver by function name only, so the table keeps at most one
//! callback per name: registering again replaces the earlier receiver.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use trellis_value::DomValue;

use crate::logging::targets;

/// Receiver for the result of a remote function call.
pub type CallFunctionCallback = Arc<dyn Fn(&DomValue) + Send + Sync>;

/// Per-node table of pending call receivers, keyed by function name.
#[derive(Default)]
pub struct CallbackTable {
    callbacks: Mutex<HashMap<String, CallFunctionCallback>>,
}

impl CallbackTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `callback` under `name`, returning the receiver it replaced.
    pub fn register(
        &self,
        name: impl Into<String>,
        callback: CallFunctionCallback,
    ) -> Option<CallFunctionCallback> {
        let name = name.into();
        let replaced = self.callbacks.lock().insert(name.clone(), callback);
        if replaced.is_some() {
            tracing::debug!(target: targets::CALLBACK, %name, "replaced pending callback");
        }
        replaced
    }

    /// The receiver currently registered under `name`.
    pub fn get(&self, name: &str) -> Option<CallFunctionCallback> {
        self.callbacks.lock().get(name).cloned()
    }

    /// Remove and return the receiver registered under `name`.
    pub fn take(&self, name: &str) -> Option<CallFunctionCallback> {
        self.callbacks.lock().remove(name)
    }

    /// Whether a receiver is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.lock().contains_key(name)
    }

    /// Number of registered receivers.
    pub fn len(&self) -> usize {
        self.callbacks.lock().len()
    }

    /// Whether no receiver is registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.lock().is_empty()
    }
}

impl fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let callbacks = self.callbacks.lock();
        let mut names: Vec<&String> = callbacks.keys().collect();
        names.sort();
        f.debug_struct("CallbackTable").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_replaces_previous() {
        let table = CallbackTable::new();
        let first: CallFunctionCallback = Arc::new(|_: &DomValue| {});
        let second: CallFunctionCallback = Arc::new(|_: &DomValue| {});

        assert!(table.register("foo", first.clone()).is_none());
        let replaced = table.register("foo", second.clone()).unwrap();

        assert!(Arc::ptr_eq(&replaced, &first));
        assert!(Arc::ptr_eq(&table.get("foo").unwrap(), &second));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_missing_name_is_none() {
        let table = CallbackTable::new();
        assert!(table.get("missing").is_none());
        assert!(table.take("missing").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_take_removes() {
        let table = CallbackTable::new();
        table.register("scroll", Arc::new(|_: &DomValue| {}));
        assert!(table.take("scroll").is_some());
        assert!(!table.contains("scroll"));
    }

    #[test]
    fn test_debug_lists_names() {
        let table = CallbackTable::new();
        table.register("b", Arc::new(|_: &DomValue| {}));
        table.register("a", Arc::new(|_: &DomValue| {}));
        assert_eq!(format!("{table:?}"), r#"CallbackTable { names: ["a", "b"] }"#);
    }
}
