//! The tree node.
//!
//! A [`DomNode`] is one element of the UI hierarchy. Nodes are always handled
//! through `Arc<DomNode>`:
//!
//! - a parent owns its children (`Arc` down),
//! - a child points at its parent with a `Weak` reference (never up-owning),
//! - every node points at its tree manager with a `Weak` reference.
//!
//! Reading through a weak reference whose target is gone yields `None`; that
//! is a normal outcome, not an error.
//!
//! # Locking
//!
//! Each mutable part of a node sits behind its own `parking_lot` lock. When two
//! locks are held at once the parent's is taken before the child's, and no
//! lock is held while a listener, callback or manager hook runs.
//!
//! # Example
//!
//! ```
//! use trellis_dom::DomNode;
//!
//! let parent = DomNode::new(1, None, 0);
//! parent.add_child_at(DomNode::new(2, None, 0), 0).unwrap();
//! parent.add_child_at(DomNode::new(3, None, 0), 1).unwrap();
//!
//! let removed = parent.remove_child_at(0).unwrap();
//! assert_eq!(removed.id(), 2);
//! assert!(removed.parent().is_none());
//! assert_eq!(parent.get_child_at(0).unwrap().index(), 0);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::callback::{CallFunctionCallback, CallbackTable};
use crate::error::{DomError, DomResult};
use crate::layout::{LayoutNode, LayoutResult};
use crate::listener::{
    DomEvent, EventChannel, EventPayload, LayoutEvent, ListenerId, ListenerRegistry, ShowEvent,
    TouchEventInfo, TouchPhase, boxed_listener,
};
use crate::logging::{NodeTreeDebug, targets};
use crate::manager::DomManager;
use crate::style::{PendingDiff, StyleMap, merge_style};

/// Link from a logical node to its native view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderInfo {
    /// Id of the node whose native view hosts this one.
    pub pid: Option<u32>,
    /// Position within the render parent.
    pub index: Option<usize>,
    /// Whether the native view exists.
    pub created: bool,
}

impl RenderInfo {
    /// Forget the native view.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What happens to render bindings of a removed subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderBindingPolicy {
    /// Leave bindings untouched so the subtree can be re-inserted as is.
    #[default]
    Keep,
    /// Reset the binding of every node in the removed subtree.
    Reset,
}

#[derive(Debug, Default)]
pub(crate) struct NodeData {
    pid: Option<u32>,
    index: usize,
    tag_name: String,
    view_name: String,
    is_virtual: bool,
    is_just_layout: bool,
    style: StyleMap,
    ext: StyleMap,
    render_info: RenderInfo,
    pub(crate) layout: LayoutResult,
}

/// One element of the UI hierarchy.
pub struct DomNode {
    id: u32,
    pub(crate) data: RwLock<NodeData>,
    diff: Mutex<PendingDiff>,
    parent: RwLock<Weak<DomNode>>,
    children: RwLock<Vec<Arc<DomNode>>>,
    manager: RwLock<Option<Weak<dyn DomManager>>>,
    pub(crate) layout: Mutex<LayoutNode>,
    pub(crate) listeners: ListenerRegistry,
    callbacks: CallbackTable,
}

impl DomNode {
    /// Create a detached node with the given identity.
    pub fn new(id: u32, pid: Option<u32>, index: usize) -> Arc<Self> {
        Self::builder(id).pid(pid).index(index).build()
    }

    /// Start building a node.
    pub fn builder(id: u32) -> DomNodeBuilder {
        DomNodeBuilder::new(id)
    }

    // =========================================================================
    // Identity and attributes
    // =========================================================================

    /// Node id.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Parent id, `None` when detached.
    pub fn pid(&self) -> Option<u32> {
        self.data.read().pid
    }

    /// Set the stored parent id.
    pub fn set_pid(&self, pid: Option<u32>) {
        self.data.write().pid = pid;
    }

    /// Position within the parent's children.
    pub fn index(&self) -> usize {
        self.data.read().index
    }

    /// Set the stored index.
    pub fn set_index(&self, index: usize) {
        self.data.write().index = index;
    }

    /// Logical component kind.
    pub fn tag_name(&self) -> String {
        self.data.read().tag_name.clone()
    }

    /// Set the logical component kind.
    pub fn set_tag_name(&self, tag_name: impl Into<String>) {
        self.data.write().tag_name = tag_name.into();
    }

    /// Backing native primitive.
    pub fn view_name(&self) -> String {
        self.data.read().view_name.clone()
    }

    /// Set the backing native primitive.
    pub fn set_view_name(&self, view_name: impl Into<String>) {
        self.data.write().view_name = view_name.into();
    }

    /// Whether the node has no native view.
    pub fn is_virtual(&self) -> bool {
        self.data.read().is_virtual
    }

    pub fn set_is_virtual(&self, is_virtual: bool) {
        self.data.write().is_virtual = is_virtual;
    }

    /// Whether the node only contributes to layout.
    pub fn is_just_layout(&self) -> bool {
        self.data.read().is_just_layout
    }

    pub fn set_is_just_layout(&self, is_just_layout: bool) {
        self.data.write().is_just_layout = is_just_layout;
    }

    pub fn render_info(&self) -> RenderInfo {
        self.data.read().render_info
    }

    pub fn set_render_info(&self, render_info: RenderInfo) {
        self.data.write().render_info = render_info;
    }

    /// Geometry from the last layout pass.
    pub fn layout_result(&self) -> LayoutResult {
        self.data.read().layout
    }

    // =========================================================================
    // Property maps
    // =========================================================================

    /// Copy of the style map.
    pub fn style(&self) -> StyleMap {
        self.data.read().style.clone()
    }

    /// Copy of the extension map.
    pub fn ext_style(&self) -> StyleMap {
        self.data.read().ext.clone()
    }

    /// Copy of the properties changed since the last render sync.
    pub fn diff_style(&self) -> StyleMap {
        self.diff.lock().snapshot()
    }

    /// Replace the pending changes wholesale.
    pub fn set_diff_style(&self, diff: StyleMap) {
        self.diff.lock().replace(diff);
    }

    /// Drain the pending changes for render sync.
    pub fn take_diff_style(&self) -> StyleMap {
        self.diff.lock().take_and_clear()
    }

    /// Merge `changes` into the style map and the pending changes.
    ///
    /// A [`DomValue::Null`](trellis_value::DomValue::Null) value removes the
    /// key from the style map. Layout constraints are re-parsed when a layout
    /// key is involved.
    pub fn update_style(&self, changes: &StyleMap) {
        merge_style(&mut self.data.write().style, changes);
        self.diff.lock().merge(changes);
        if changes.keys().any(|key| crate::layout::is_layout_key(key)) {
            self.parse_layout_style_info();
        }
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    /// The parent, if attached and still alive.
    pub fn parent(&self) -> Option<Arc<DomNode>> {
        self.parent.read().upgrade()
    }

    /// The tree manager, if set and still alive.
    pub fn manager(&self) -> Option<Arc<dyn DomManager>> {
        self.manager.read().as_ref().and_then(Weak::upgrade)
    }

    /// Set or clear the tree manager.
    pub fn set_manager(&self, manager: Option<Weak<dyn DomManager>>) {
        *self.manager.write() = manager;
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.children.read().len()
    }

    /// Snapshot of the children.
    pub fn children(&self) -> Vec<Arc<DomNode>> {
        self.children.read().clone()
    }

    /// The child at `index`, or `None` if out of range.
    pub fn get_child_at(&self, index: usize) -> Option<Arc<DomNode>> {
        self.children.read().get(index).cloned()
    }

    /// Position of `child` among this node's children, by identity.
    pub fn index_of(&self, child: &DomNode) -> Option<usize> {
        self.children
            .read()
            .iter()
            .position(|candidate| std::ptr::eq(Arc::as_ptr(candidate), child))
    }

    /// Insert `node` at `index`, or append when `index` is past the end.
    ///
    /// Rejected without any mutation when the node is this node or one of its
    /// ancestors, or is still attached to a live parent. It is also rejected
    /// when any id in the inserted subtree is already used in the destination
    /// tree or by a different live node known to the tree manager.
    pub fn add_child_at(self: &Arc<Self>, node: Arc<DomNode>, index: usize) -> DomResult<()> {
        if let Err(error) = self.check_insertable(&node) {
            tracing::warn!(target: targets::NODE, parent = self.id, child = node.id, %error, "rejected insertion");
            return Err(error);
        }

        let index = {
            let mut children = self.children.write();
            let index = index.min(children.len());
            children.insert(index, Arc::clone(&node));
            restamp(&children, index);
            index
        };
        *node.parent.write() = Arc::downgrade(self);
        node.data.write().pid = Some(self.id);

        let manager = self.manager.read().clone();
        if let Some(manager) = manager {
            node.inherit_manager(&manager);
        }

        tracing::trace!(target: targets::NODE, parent = self.id, child = node.id, index, "child inserted");

        if let Some(manager) = self.manager() {
            manager.on_child_inserted(self, &node, index);
        }
        node.listeners
            .dispatch(&EventChannel::AttachChanged, &EventPayload::Attached(true));
        Ok(())
    }

    /// Remove and return the child at `index`, keeping render bindings.
    pub fn remove_child_at(&self, index: usize) -> Option<Arc<DomNode>> {
        self.remove_child_at_with(index, RenderBindingPolicy::Keep)
    }

    /// Remove and return the child at `index`.
    ///
    /// The removed subtree keeps its own structure and can be inserted
    /// elsewhere. `policy` decides whether its render bindings survive.
    pub fn remove_child_at_with(&self, index: usize, policy: RenderBindingPolicy) -> Option<Arc<DomNode>> {
        let node = {
            let mut children = self.children.write();
            if index >= children.len() {
                return None;
            }
            let node = children.remove(index);
            restamp(&children, index);
            node
        };
        *node.parent.write() = Weak::new();
        node.data.write().pid = None;

        if policy == RenderBindingPolicy::Reset {
            node.reset_render_bindings();
        }

        tracing::trace!(target: targets::NODE, parent = self.id, child = node.id, index, ?policy, "child removed");

        if let Some(manager) = self.manager() {
            manager.on_child_removed(self, &node, index);
        }
        node.listeners
            .dispatch(&EventChannel::AttachChanged, &EventPayload::Attached(false));
        Some(node)
    }

    fn check_insertable(self: &Arc<Self>, node: &Arc<DomNode>) -> DomResult<()> {
        let mut root = Arc::clone(self);
        let mut ancestor = Some(Arc::clone(self));
        while let Some(current) = ancestor {
            if Arc::ptr_eq(&current, node) {
                return Err(DomError::CircularParentage {
                    parent: self.id,
                    child: node.id,
                });
            }
            ancestor = current.parent();
            root = current;
        }

        if let Some(parent) = node.parent() {
            return Err(DomError::AlreadyAttached {
                child: node.id,
                parent: parent.id,
            });
        }

        let incoming = node.subtree();
        let mut taken: HashSet<u32> = root.subtree().iter().map(|existing| existing.id).collect();
        let manager = self.manager();
        for candidate in &incoming {
            if !taken.insert(candidate.id) {
                return Err(DomError::DuplicateId(candidate.id));
            }
            if let Some(existing) = manager.as_ref().and_then(|manager| manager.node(candidate.id)) {
                if !Arc::ptr_eq(&existing, candidate) {
                    return Err(DomError::DuplicateId(candidate.id));
                }
            }
        }
        Ok(())
    }

    /// This node and all its descendants, pre-order.
    pub fn subtree(self: &Arc<Self>) -> Vec<Arc<DomNode>> {
        let mut nodes = Vec::new();
        let mut stack = vec![Arc::clone(self)];
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            nodes.push(node);
        }
        nodes
    }

    fn inherit_manager(&self, manager: &Weak<dyn DomManager>) {
        {
            let mut slot = self.manager.write();
            if slot.is_some() {
                return;
            }
            *slot = Some(Weak::clone(manager));
        }
        for child in self.children() {
            child.inherit_manager(manager);
        }
    }

    fn reset_render_bindings(&self) {
        self.data.write().render_info.reset();
        for child in self.children() {
            child.reset_render_bindings();
        }
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Listener storage for all channels of this node.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn add_click_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners
            .add(EventChannel::Click, boxed_listener(move |_| listener()))
    }

    pub fn remove_click_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(&EventChannel::Click, id)
    }

    pub fn add_long_click_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners
            .add(EventChannel::LongClick, boxed_listener(move |_| listener()))
    }

    pub fn remove_long_click_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(&EventChannel::LongClick, id)
    }

    /// Listen for one phase of touch gestures.
    pub fn add_touch_listener<F>(&self, phase: TouchPhase, listener: F) -> ListenerId
    where
        F: Fn(&TouchEventInfo) + Send + Sync + 'static,
    {
        self.listeners.add(
            EventChannel::Touch(phase),
            boxed_listener(move |payload| {
                if let EventPayload::Touch(info) = *payload {
                    listener(info);
                }
            }),
        )
    }

    pub fn remove_touch_listener(&self, phase: TouchPhase, id: ListenerId) -> bool {
        self.listeners.remove(&EventChannel::Touch(phase), id)
    }

    pub fn add_show_listener<F>(&self, event: ShowEvent, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners
            .add(EventChannel::Show(event), boxed_listener(move |_| listener()))
    }

    pub fn remove_show_listener(&self, event: ShowEvent, id: ListenerId) -> bool {
        self.listeners.remove(&EventChannel::Show(event), id)
    }

    /// Listen for application events named `name`.
    pub fn add_dom_event_listener<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&DomEvent) + Send + Sync + 'static,
    {
        self.listeners.add(
            EventChannel::Dom(name.into()),
            boxed_listener(move |payload| {
                if let EventPayload::Dom(event) = *payload {
                    listener(event);
                }
            }),
        )
    }

    pub fn remove_dom_event_listener(&self, name: &str, id: ListenerId) -> bool {
        self.listeners.remove(&EventChannel::Dom(name.to_string()), id)
    }

    /// Listen for layout results of this node.
    pub fn add_on_layout_listener<F>(&self, event: LayoutEvent, listener: F) -> ListenerId
    where
        F: Fn(&LayoutResult) + Send + Sync + 'static,
    {
        self.listeners.add(
            EventChannel::Layout(event),
            boxed_listener(move |payload| {
                if let EventPayload::Layout(result) = *payload {
                    listener(result);
                }
            }),
        )
    }

    pub fn remove_on_layout_listener(&self, event: LayoutEvent, id: ListenerId) -> bool {
        self.listeners.remove(&EventChannel::Layout(event), id)
    }

    /// Listen for this node being attached to (`true`) or detached from
    /// (`false`) a parent.
    pub fn set_on_attach_changed_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.listeners.add(
            EventChannel::AttachChanged,
            boxed_listener(move |payload| {
                if let EventPayload::Attached(attached) = *payload {
                    listener(attached);
                }
            }),
        )
    }

    pub fn remove_on_attach_changed_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(&EventChannel::AttachChanged, id)
    }

    /// Whether any touch listener is registered, for any phase.
    pub fn has_touch_event_listeners(&self) -> bool {
        self.listeners.has_touch_listeners()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Deliver a click. Returns the number of listeners invoked.
    pub fn call_click(&self) -> usize {
        self.listeners.dispatch(&EventChannel::Click, &EventPayload::Empty)
    }

    /// Deliver a long click. Returns the number of listeners invoked.
    pub fn call_long_click(&self) -> usize {
        self.listeners
            .dispatch(&EventChannel::LongClick, &EventPayload::Empty)
    }

    /// Deliver a touch in `phase`. Returns the number of listeners invoked.
    pub fn call_touch(&self, phase: TouchPhase, info: &TouchEventInfo) -> usize {
        self.listeners
            .dispatch(&EventChannel::Touch(phase), &EventPayload::Touch(info))
    }

    /// Deliver a visibility change. Returns the number of listeners invoked.
    pub fn call_on_show(&self, event: ShowEvent) -> usize {
        self.listeners
            .dispatch(&EventChannel::Show(event), &EventPayload::Empty)
    }

    /// Deliver an application event to listeners registered under its name.
    pub fn on_dom_node_state_change(&self, event: &DomEvent) -> usize {
        self.listeners.dispatch(
            &EventChannel::Dom(event.name().to_string()),
            &EventPayload::Dom(event),
        )
    }

    // =========================================================================
    // Remote calls
    // =========================================================================

    /// Run `name` remotely and deliver its result to `callback`.
    ///
    /// The callback is recorded first, replacing any earlier one under the
    /// same name, and stays recorded when the manager is gone or the
    /// transport fails.
    pub fn call_function(&self, name: &str, params: &StyleMap, callback: CallFunctionCallback) -> DomResult<()> {
        self.callbacks.register(name, callback);

        let Some(manager) = self.manager() else {
            tracing::debug!(target: targets::CALLBACK, id = self.id, name, "no tree manager, call not sent");
            return Ok(());
        };
        tracing::debug!(target: targets::CALLBACK, id = self.id, name, "calling function");
        manager
            .call_function(self.id, name, params)
            .inspect_err(|error| {
                tracing::warn!(target: targets::CALLBACK, id = self.id, name, %error, "call dispatch failed");
            })
    }

    /// The callback most recently recorded under `name`.
    pub fn get_callback(&self, name: &str) -> Option<CallFunctionCallback> {
        self.callbacks.get(name)
    }

    /// Remove and return the callback recorded under `name`.
    pub fn take_callback(&self, name: &str) -> Option<CallFunctionCallback> {
        self.callbacks.take(name)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Render this subtree as an indented tree.
    pub fn dump_tree(&self) -> String {
        NodeTreeDebug::new().format_subtree(self)
    }
}

/// Rewrite the stored index of every child from `from` on.
fn restamp(children: &[Arc<DomNode>], from: usize) {
    for (index, child) in children.iter().enumerate().skip(from) {
        child.data.write().index = index;
    }
}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.read();
        f.debug_struct("DomNode")
            .field("id", &self.id)
            .field("pid", &data.pid)
            .field("index", &data.index)
            .field("tag_name", &data.tag_name)
            .field("view_name", &data.view_name)
            .field("child_count", &self.children.read().len())
            .field("layout", &data.layout)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(DomNode: Send, Sync);

/// Builder for [`DomNode`].
#[must_use]
pub struct DomNodeBuilder {
    id: u32,
    pid: Option<u32>,
    index: usize,
    tag_name: String,
    view_name: String,
    style: StyleMap,
    ext: StyleMap,
    manager: Option<Weak<dyn DomManager>>,
}

impl DomNodeBuilder {
    fn new(id: u32) -> Self {
        Self {
            id,
            pid: None,
            index: 0,
            tag_name: String::new(),
            view_name: String::new(),
            style: StyleMap::new(),
            ext: StyleMap::new(),
            manager: None,
        }
    }

    pub fn pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = tag_name.into();
        self
    }

    pub fn view_name(mut self, view_name: impl Into<String>) -> Self {
        self.view_name = view_name.into();
        self
    }

    pub fn style(mut self, style: StyleMap) -> Self {
        self.style = style;
        self
    }

    pub fn ext_style(mut self, ext: StyleMap) -> Self {
        self.ext = ext;
        self
    }

    /// Attach the node to a tree manager without taking ownership of it.
    pub fn manager<M: DomManager + 'static>(mut self, manager: &Arc<M>) -> Self {
        let weak: Weak<M> = Arc::downgrade(manager);
        let weak: Weak<dyn DomManager> = weak;
        self.manager = Some(weak);
        self
    }

    /// Create the node and parse its layout constraints.
    pub fn build(self) -> Arc<DomNode> {
        let node = Arc::new(DomNode {
            id: self.id,
            data: RwLock::new(NodeData {
                pid: self.pid,
                index: self.index,
                tag_name: self.tag_name,
                view_name: self.view_name,
                style: self.style,
                ext: self.ext,
                ..Default::default()
            }),
            diff: Mutex::new(PendingDiff::new()),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
            manager: RwLock::new(self.manager),
            layout: Mutex::new(LayoutNode::new()),
            listeners: ListenerRegistry::new(),
            callbacks: CallbackTable::new(),
        });
        node.parse_layout_style_info();
        tracing::trace!(target: targets::NODE, id = node.id, "node created");
        node
    }
}
