//! Node model for the Trellis rendering tree.
//!
//! This crate provides the element tree that sits between a declarative UI
//! description and the native views that display it:
//!
//! - **Tree Nodes**: Parent-child ownership with consistent indices and weak back-references
//! - **Layout**: Style-to-constraint parsing, a `taffy`-backed flexbox engine, result propagation
//! - **Listeners**: Click, long-click, touch, visibility, application, layout and attach events
//! - **Remote Calls**: Named asynchronous calls answered through per-node callbacks
//! - **Tree Manager**: The contract nodes use to reach their manager, plus a simple registry
//! - **Diagnostics**: Tracing targets and a subtree pretty-printer
//!
//! # Tree Example
//!
//! ```
//! use trellis_dom::DomNode;
//!
//! let root = DomNode::builder(1).tag_name("View").build();
//! let label = DomNode::builder(2).tag_name("Text").build();
//! root.add_child_at(label.clone(), 0).unwrap();
//!
//! assert_eq!(root.index_of(&label), Some(0));
//! assert_eq!(label.pid(), Some(1));
//! ```
//!
//! # Layout Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_dom::layout::{AvailableSize, TaffyLayoutEngine};
//! use trellis_dom::listener::LayoutEvent;
//! use trellis_dom::{DomNode, DomValue, StyleMap};
//!
//! let mut style = StyleMap::new();
//! style.insert("flexDirection".to_string(), Arc::new(DomValue::from("row")));
//! let row = DomNode::builder(1).style(style).build();
//!
//! let cell = DomNode::new(2, None, 0);
//! cell.set_size(40.0, 20.0);
//! cell.add_on_layout_listener(LayoutEvent::OnLayout, |result| {
//!     println!("cell is now {}x{}", result.width, result.height);
//! });
//! row.add_child_at(cell.clone(), 0).unwrap();
//!
//! let mut engine = TaffyLayoutEngine::new();
//! row.do_layout_with(&mut engine, AvailableSize::definite(320.0, 480.0)).unwrap();
//! assert_eq!(cell.size(), (40.0, 20.0));
//! ```
//!
//! # Remote Call Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_dom::{DomNode, DomValue, NodeRegistry, StyleMap};
//!
//! let (registry, calls) = NodeRegistry::with_call_channel();
//! let registry = Arc::new(registry);
//! let node = DomNode::builder(7).manager(&registry).build();
//! registry.register(&node).unwrap();
//!
//! node.call_function("measure", &StyleMap::new(), Arc::new(|result: &DomValue| {
//!     println!("measured: {result}");
//! }))
//! .unwrap();
//!
//! let call = calls.recv().unwrap();
//! assert!(registry.deliver_call_result(call.node_id, &call.name, &DomValue::from(42)));
//! ```

pub mod callback;
mod error;
pub mod layout;
pub mod listener;
pub mod logging;
pub mod manager;
pub mod node;
mod style;

pub use callback::{CallFunctionCallback, CallbackTable};
pub use error::{DomError, DomResult};
pub use layout::{AvailableSize, LayoutConfig, LayoutEngine, LayoutResult, TaffyLayoutEngine};
pub use listener::{
    DomEvent, EventChannel, LayoutEvent, ListenerId, ShowEvent, TouchEventInfo, TouchPhase,
};
pub use logging::{NodeTreeDebug, PerfSpan, TreeFormatOptions, TreeStyle};
pub use manager::{DomManager, FunctionCall, NodeRegistry};
pub use node::{DomNode, DomNodeBuilder, RenderBindingPolicy, RenderInfo};
pub use style::{PendingDiff, StyleMap};

// Re-export the value type used in every property map
pub use trellis_value::DomValue;
