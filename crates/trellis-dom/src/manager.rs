//! The tree-manager contract.
//!
//! A tree manager creates and destroys nodes, batches their mutations and
//! talks to the outside world. Nodes hold only a weak reference to it and go
//! through [`DomManager`] for three things:
//!
//! - looking another node up by id (duplicate-id checks),
//! - structural-change notifications,
//! - the transport for remote function calls.
//!
//! [`NodeRegistry`] is a minimal implementation that indexes nodes by id and
//! forwards remote calls over a `crossbeam-channel`.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use trellis_value::DomValue;

use crate::error::{DomError, DomResult};
use crate::logging::targets;
use crate::node::DomNode;
use crate::style::StyleMap;

/// Services a node needs from the manager of its tree.
pub trait DomManager: Send + Sync {
    /// Look up a live node by id.
    fn node(&self, id: u32) -> Option<Arc<DomNode>>;

    /// Called after `child` was inserted under `parent` at `index`.
    fn on_child_inserted(&self, parent: &DomNode, child: &Arc<DomNode>, index: usize) {
        let _ = (parent, child, index);
    }

    /// Called after `child` was removed from `parent` at `index`.
    fn on_child_removed(&self, parent: &DomNode, child: &Arc<DomNode>, index: usize) {
        let _ = (parent, child, index);
    }

    /// Ask the outside world to run `name` on behalf of `node_id`.
    fn call_function(&self, node_id: u32, name: &str, params: &StyleMap) -> DomResult<()>;
}

/// A remote call waiting to be executed.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    /// Node that issued the call.
    pub node_id: u32,
    /// Function name.
    pub name: String,
    /// Call parameters.
    pub params: StyleMap,
}

/// Id-indexed [`DomManager`] with an optional channel-backed call transport.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: RwLock<HashMap<u32, Weak<DomNode>>>,
    calls: Option<Sender<FunctionCall>>,
}

impl NodeRegistry {
    /// Create a registry without a call transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry whose remote calls are sent to the returned receiver.
    pub fn with_call_channel() -> (Self, Receiver<FunctionCall>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let registry = Self {
            nodes: RwLock::new(HashMap::new()),
            calls: Some(sender),
        };
        (registry, receiver)
    }

    /// Index `node` by its id.
    ///
    /// Fails with [`DomError::DuplicateId`] if a different live node already
    /// holds the id. Entries of dropped nodes are replaced.
    pub fn register(&self, node: &Arc<DomNode>) -> DomResult<()> {
        let mut nodes = self.nodes.write();
        if let Some(existing) = nodes.get(&node.id()).and_then(Weak::upgrade) {
            if !Arc::ptr_eq(&existing, node) {
                tracing::warn!(target: targets::MANAGER, id = node.id(), "rejected duplicate node id");
                return Err(DomError::DuplicateId(node.id()));
            }
        }
        nodes.insert(node.id(), Arc::downgrade(node));
        Ok(())
    }

    /// Drop the entry for `id`. Returns whether one existed.
    pub fn unregister(&self, id: u32) -> bool {
        self.nodes.write().remove(&id).is_some()
    }

    /// Number of entries, including ones whose node was dropped.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Remove entries whose node was dropped. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut nodes = self.nodes.write();
        let before = nodes.len();
        nodes.retain(|_, node| node.strong_count() > 0);
        before - nodes.len()
    }

    /// Hand the result of a remote call to the node that asked for it.
    ///
    /// Returns `false` if the node is gone or has no callback for `name`.
    pub fn deliver_call_result(&self, node_id: u32, name: &str, result: &DomValue) -> bool {
        let Some(callback) = self.node(node_id).and_then(|node| node.get_callback(name)) else {
            tracing::debug!(target: targets::MANAGER, node_id, name, "no receiver for call result");
            return false;
        };
        callback(result);
        true
    }
}

impl DomManager for NodeRegistry {
    fn node(&self, id: u32) -> Option<Arc<DomNode>> {
        self.nodes.read().get(&id).and_then(Weak::upgrade)
    }

    fn on_child_inserted(&self, parent: &DomNode, child: &Arc<DomNode>, index: usize) {
        tracing::trace!(target: targets::MANAGER, parent = parent.id(), child = child.id(), index, "child inserted");
        for node in child.subtree() {
            if let Err(error) = self.register(&node) {
                tracing::warn!(target: targets::MANAGER, id = node.id(), %error, "inserted node not indexed");
            }
        }
    }

    fn on_child_removed(&self, parent: &DomNode, child: &Arc<DomNode>, index: usize) {
        tracing::trace!(target: targets::MANAGER, parent = parent.id(), child = child.id(), index, "child removed");
        let removed = child.subtree();
        let mut nodes = self.nodes.write();
        for node in &removed {
            // Only drop entries that still point at the removed node.
            let indexed = nodes
                .get(&node.id())
                .is_some_and(|entry| std::ptr::eq(entry.as_ptr(), Arc::as_ptr(node)));
            if indexed {
                nodes.remove(&node.id());
            }
        }
    }

    fn call_function(&self, node_id: u32, name: &str, params: &StyleMap) -> DomResult<()> {
        let Some(calls) = &self.calls else {
            return Err(DomError::call_dispatch(node_id, name, "no call transport"));
        };
        calls
            .send(FunctionCall {
                node_id,
                name: name.to_string(),
                params: params.clone(),
            })
            .map_err(|e| DomError::call_dispatch(node_id, name, e.to_string()))
    }
}

static_assertions::assert_impl_all!(NodeRegistry: Send, Sync);
