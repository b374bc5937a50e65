//! Per-node event listener registry.
//!
//! Every node owns one [`ListenerRegistry`]. All event kinds share a single
//! map keyed by [`EventChannel`] (event kind plus qualifier), and all
//! registrations draw their [`ListenerId`] from one counter, so a handle is
//! unique across every channel of the node and is never reused.
//!
//! # Dispatch
//!
//! [`ListenerRegistry::dispatch`] snapshots the entries of a channel, releases
//! the lock, and then invokes them in registration order. Listeners are free
//! to add or remove listeners on the same node while being invoked:
//!
//! - an entry removed during dispatch is skipped if it has not run yet,
//! - an entry added during dispatch runs on the next dispatch only.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use trellis_dom::listener::{boxed_listener, EventChannel, EventPayload, ListenerRegistry};
//!
//! let registry = ListenerRegistry::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let hits_clone = hits.clone();
//! let id = registry.add(
//!     EventChannel::Click,
//!     boxed_listener(move |_| {
//!         hits_clone.fetch_add(1, Ordering::SeqCst);
//!     }),
//! );
//!
//! registry.dispatch(&EventChannel::Click, &EventPayload::Empty);
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//!
//! assert!(registry.remove(&EventChannel::Click, id));
//! assert!(!registry.remove(&EventChannel::Click, id));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use trellis_value::DomValue;

use crate::layout::LayoutResult;
use crate::logging::targets;

/// Handle identifying one listener registration.
///
/// Handles are allocated from a per-node counter shared by all channels and
/// are never reused while the node is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Phase of a touch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// A finger went down.
    Start,
    /// A finger moved.
    Move,
    /// A finger went up.
    End,
    /// The platform cancelled the gesture.
    Cancel,
}

/// Position of a touch, in the node's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TouchEventInfo {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

impl TouchEventInfo {
    /// Create touch info at the given position.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Visibility transition of a node's native view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowEvent {
    /// The view became visible.
    Show,
    /// The view was dismissed.
    Dismiss,
}

/// Phase of a layout pass that listeners can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutEvent {
    /// The node's layout result changed in the last pass.
    #[default]
    OnLayout,
}

/// A generic application event routed to a node by name.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    name: String,
    target: u32,
    value: Option<DomValue>,
}

impl DomEvent {
    /// Create an event without a payload.
    pub fn new(name: impl Into<String>, target: u32) -> Self {
        Self {
            name: name.into(),
            target,
            value: None,
        }
    }

    /// Create an event carrying a value.
    pub fn with_value(name: impl Into<String>, target: u32, value: DomValue) -> Self {
        Self {
            name: name.into(),
            target,
            value: Some(value),
        }
    }

    /// Event name; also the qualifier listeners register under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the node the event is addressed to.
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Optional payload.
    pub fn value(&self) -> Option<&DomValue> {
        self.value.as_ref()
    }
}

/// An event kind together with its qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventChannel {
    /// Click.
    Click,
    /// Long click.
    LongClick,
    /// Touch, qualified by phase.
    Touch(TouchPhase),
    /// Visibility, qualified by show/dismiss.
    Show(ShowEvent),
    /// Application event, qualified by event name.
    Dom(String),
    /// Layout completion, qualified by layout phase.
    Layout(LayoutEvent),
    /// The node was attached to or detached from a parent.
    AttachChanged,
}

/// Data handed to a listener when its channel is dispatched.
#[derive(Debug, Clone, Copy)]
pub enum EventPayload<'a> {
    /// No data (click, long click, show).
    Empty,
    /// Touch position.
    Touch(&'a TouchEventInfo),
    /// Application event.
    Dom(&'a DomEvent),
    /// Fresh layout result.
    Layout(&'a LayoutResult),
    /// New attach state.
    Attached(bool),
}

/// Type-erased listener callback.
pub type Listener = Arc<dyn Fn(&EventPayload<'_>) + Send + Sync>;

/// Box a closure as a [`Listener`].
pub fn boxed_listener<F>(listener: F) -> Listener
where
    F: Fn(&EventPayload<'_>) + Send + Sync + 'static,
{
    Arc::new(listener)
}

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    channels: HashMap<EventChannel, Vec<(ListenerId, Listener)>>,
    touch_listener_count: usize,
}

/// Listener storage for a single node.
#[derive(Default)]
pub struct ListenerRegistry {
    state: Mutex<RegistryState>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener on a channel and return its handle.
    pub fn add(&self, channel: EventChannel, listener: Listener) -> ListenerId {
        let mut state = self.state.lock();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        if matches!(channel, EventChannel::Touch(_)) {
            state.touch_listener_count += 1;
        }
        tracing::trace!(target: targets::LISTENER, ?channel, %id, "listener added");
        state.channels.entry(channel).or_default().push((id, listener));
        id
    }

    /// Remove a listener from a channel.
    ///
    /// Returns `false` if no listener with that handle is registered on the
    /// channel; that case is not an error.
    pub fn remove(&self, channel: &EventChannel, id: ListenerId) -> bool {
        let mut state = self.state.lock();
        let Some(entries) = state.channels.get_mut(channel) else {
            return false;
        };
        let Some(position) = entries.iter().position(|(entry_id, _)| *entry_id == id) else {
            return false;
        };
        entries.remove(position);
        if entries.is_empty() {
            state.channels.remove(channel);
        }
        if matches!(channel, EventChannel::Touch(_)) {
            state.touch_listener_count -= 1;
        }
        tracing::trace!(target: targets::LISTENER, ?channel, %id, "listener removed");
        true
    }

    /// Check whether a handle is registered on a channel.
    pub fn contains(&self, channel: &EventChannel, id: ListenerId) -> bool {
        self.state
            .lock()
            .channels
            .get(channel)
            .is_some_and(|entries| entries.iter().any(|(entry_id, _)| *entry_id == id))
    }

    /// Number of listeners registered on a channel.
    pub fn listener_count(&self, channel: &EventChannel) -> usize {
        self.state.lock().channels.get(channel).map_or(0, Vec::len)
    }

    /// Whether any touch listener is registered, for any phase.
    pub fn has_touch_listeners(&self) -> bool {
        self.state.lock().touch_listener_count > 0
    }

    /// Remove every listener. Handles keep counting up afterwards.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.channels.clear();
        state.touch_listener_count = 0;
    }

    /// Invoke every listener of a channel in registration order.
    ///
    /// Returns the number of listeners that were invoked.
    pub fn dispatch(&self, channel: &EventChannel, payload: &EventPayload<'_>) -> usize {
        let snapshot = match self.state.lock().channels.get(channel) {
            Some(entries) => entries.clone(),
            None => return 0,
        };
        tracing::trace!(target: targets::LISTENER, ?channel, listener_count = snapshot.len(), "dispatching event");

        let mut invoked = 0;
        for (id, listener) in snapshot {
            // Skip entries removed by an earlier listener in this dispatch.
            if !self.contains(channel, id) {
                continue;
            }
            listener(payload);
            invoked += 1;
        }
        invoked
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ListenerRegistry")
            .field("next_id", &state.next_id)
            .field("channel_count", &state.channels.len())
            .field("touch_listener_count", &state.touch_listener_count)
            .finish()
    }
}

static_assertions::assert_impl_all!(ListenerRegistry: Send, Sync);
