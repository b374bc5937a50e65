//! End-to-end tests for the node tree: structure, layout, events and remote calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use parking_lot::Mutex;
use trellis_dom::layout::LayoutOutputs;
use trellis_dom::{
    AvailableSize, CallFunctionCallback, DomError, DomEvent, DomManager, DomNode, DomResult,
    DomValue, LayoutEngine, LayoutEvent, LayoutResult, NodeRegistry, StyleMap, TaffyLayoutEngine,
    TouchEventInfo, TouchPhase,
};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("trellis_dom=trace"))
            .with_test_writer()
            .try_init();
    });
}

fn style(entries: &[(&str, DomValue)]) -> StyleMap {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_string(), Arc::new(value.clone())))
        .collect()
}

fn ids(parent: &DomNode) -> Vec<u32> {
    parent.children().iter().map(|child| child.id()).collect()
}

fn assert_consistent(parent: &Arc<DomNode>) {
    for (position, child) in parent.children().iter().enumerate() {
        assert_eq!(child.index(), position, "child {} has a stale index", child.id());
        assert_eq!(child.pid(), Some(parent.id()));
        assert!(Arc::ptr_eq(&child.parent().unwrap(), parent));
        assert_eq!(parent.index_of(child), Some(position));
    }
}

#[test]
fn test_remove_first_of_two_children() {
    init_tracing();
    let parent = DomNode::new(1, None, 0);
    let c1 = DomNode::new(2, Some(1), 0);
    let c2 = DomNode::new(3, Some(1), 1);
    parent.add_child_at(c1.clone(), 0).unwrap();
    parent.add_child_at(c2.clone(), 1).unwrap();

    let removed = parent.remove_child_at(0).unwrap();

    assert!(Arc::ptr_eq(&removed, &c1));
    assert_eq!(c2.index(), 0);
    assert_eq!(ids(&parent), vec![3]);
}

#[test]
fn test_indices_stay_consistent_over_mutation_sequence() {
    init_tracing();
    let parent = DomNode::new(1, None, 0);
    // Deterministic pseudo-random sequence of inserts and removals.
    let mut seed: u32 = 17;
    let mut next_id = 2;
    for _ in 0..200 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let roll = (seed >> 16) as usize;
        if roll % 3 == 0 && parent.child_count() > 0 {
            parent.remove_child_at(roll % parent.child_count()).unwrap();
        } else {
            let index = roll % (parent.child_count() + 2);
            parent.add_child_at(DomNode::new(next_id, None, 0), index).unwrap();
            next_id += 1;
        }
        assert_consistent(&parent);
    }
}

#[test]
fn test_remove_then_reinsert_restores_membership() {
    init_tracing();
    let parent = DomNode::new(1, None, 0);
    for (index, id) in [2, 3, 4].into_iter().enumerate() {
        parent.add_child_at(DomNode::new(id, None, 0), index).unwrap();
    }
    let grandchild = DomNode::new(10, None, 0);
    parent.get_child_at(1).unwrap().add_child_at(grandchild.clone(), 0).unwrap();

    let removed = parent.remove_child_at(1).unwrap();
    assert!(removed.parent().is_none());
    // The removed subtree stays intact.
    assert!(Arc::ptr_eq(&grandchild.parent().unwrap(), &removed));

    parent.add_child_at(removed.clone(), 1).unwrap();
    assert_eq!(ids(&parent), vec![2, 3, 4]);
    assert!(Arc::ptr_eq(&removed.parent().unwrap(), &parent));
    assert_consistent(&parent);
}

#[test]
fn test_rejections_leave_tree_untouched() {
    init_tracing();
    let root = DomNode::new(1, None, 0);
    let child = DomNode::new(2, None, 0);
    let grandchild = DomNode::new(3, None, 0);
    child.add_child_at(grandchild.clone(), 0).unwrap();
    root.add_child_at(child.clone(), 0).unwrap();

    assert!(matches!(
        grandchild.add_child_at(root.clone(), 0),
        Err(DomError::CircularParentage { .. })
    ));
    assert!(matches!(
        root.add_child_at(grandchild.clone(), 1),
        Err(DomError::AlreadyAttached { child: 3, parent: 2 })
    ));
    assert_eq!(root.add_child_at(DomNode::new(2, None, 0), 1), Err(DomError::DuplicateId(2)));

    assert_eq!(ids(&root), vec![2]);
    assert_eq!(ids(&child), vec![3]);
    assert_eq!(grandchild.child_count(), 0);
}

#[test]
fn test_layout_listener_sees_width_override() {
    init_tracing();
    let node = DomNode::new(1, None, 0);
    let widths = Arc::new(Mutex::new(Vec::new()));
    let widths_clone = widths.clone();
    node.add_on_layout_listener(LayoutEvent::OnLayout, move |result| {
        widths_clone.lock().push(result.width);
    });

    node.set_layout_width(100.0);
    node.do_layout(&mut TaffyLayoutEngine::new()).unwrap();

    assert_eq!(*widths.lock(), vec![100.0]);
}

#[test]
fn test_layout_nested_flex_tree() {
    init_tracing();
    let root = DomNode::builder(1)
        .tag_name("View")
        .style(style(&[
            ("width", DomValue::from("100%")),
            ("height", DomValue::from("100%")),
            ("flexDirection", DomValue::from("row")),
            ("padding", DomValue::from(10)),
        ]))
        .build();
    let sidebar = DomNode::builder(2)
        .style(style(&[("width", DomValue::from(80)), ("height", DomValue::from("100%"))]))
        .build();
    let content = DomNode::builder(3).style(style(&[("flex", DomValue::from(1))])).build();
    root.add_child_at(sidebar.clone(), 0).unwrap();
    root.add_child_at(content.clone(), 1).unwrap();

    root.do_layout_with(&mut TaffyLayoutEngine::new(), AvailableSize::definite(400.0, 300.0))
        .unwrap();

    let root_box = root.layout_result();
    assert_eq!((root_box.width, root_box.height), (400.0, 300.0));
    assert_eq!(root_box.padding.left, 10.0);

    let sidebar_box = sidebar.layout_result();
    assert_eq!((sidebar_box.left, sidebar_box.top), (10.0, 10.0));
    assert_eq!((sidebar_box.width, sidebar_box.height), (80.0, 280.0));

    let content_box = content.layout_result();
    assert_eq!(content_box.left, 90.0);
    assert_eq!(content_box.width, 300.0);
}

#[test]
fn test_layout_after_removal_ignores_removed_child() {
    init_tracing();
    let root = DomNode::builder(1)
        .style(style(&[("flexDirection", DomValue::from("row"))]))
        .build();
    for (index, id) in [2, 3].into_iter().enumerate() {
        let cell = DomNode::new(id, None, 0);
        cell.set_size(50.0, 10.0);
        root.add_child_at(cell, index).unwrap();
    }
    let mut engine = TaffyLayoutEngine::new();
    root.do_layout(&mut engine).unwrap();
    assert_eq!(root.size(), (100.0, 10.0));

    root.remove_child_at(0).unwrap();
    root.do_layout(&mut engine).unwrap();
    assert_eq!(root.size(), (50.0, 10.0));
    assert_eq!(root.get_child_at(0).unwrap().layout_result().left, 0.0);
}

struct BrokenEngine;

impl LayoutEngine for BrokenEngine {
    fn solve(&mut self, root: &DomNode, _available: AvailableSize) -> DomResult<LayoutOutputs> {
        Err(DomError::layout(root.id(), "constraints unsatisfiable"))
    }
}

#[test]
fn test_failed_layout_keeps_results() {
    init_tracing();
    let root = DomNode::new(1, None, 0);
    root.set_size(64.0, 32.0);
    root.do_layout(&mut TaffyLayoutEngine::new()).unwrap();
    let before = root.layout_result();

    assert!(root.do_layout(&mut BrokenEngine).is_err());
    assert_eq!(root.layout_result(), before);
    assert_eq!(before, LayoutResult::new(0.0, 0.0, 64.0, 32.0));
}

#[test]
fn test_listener_removing_itself_during_dispatch() {
    init_tracing();
    let node = DomNode::new(1, None, 0);
    let calls = Arc::new(AtomicUsize::new(0));
    let handle = Arc::new(Mutex::new(None));

    let node_weak = Arc::downgrade(&node);
    let calls_clone = calls.clone();
    let handle_clone = handle.clone();
    let id = node.add_touch_listener(TouchPhase::End, move |_| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        if let (Some(node), Some(id)) = (node_weak.upgrade(), *handle_clone.lock()) {
            node.remove_touch_listener(TouchPhase::End, id);
        }
    });
    *handle.lock() = Some(id);

    let info = TouchEventInfo::new(5.0, 5.0);
    assert_eq!(node.call_touch(TouchPhase::End, &info), 1);
    assert_eq!(node.call_touch(TouchPhase::End, &info), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!node.has_touch_event_listeners());
}

#[test]
fn test_removing_unknown_handle_keeps_others() {
    init_tracing();
    let node = DomNode::new(1, None, 0);
    let clicks = Arc::new(AtomicUsize::new(0));
    let clicks_clone = clicks.clone();
    node.add_click_listener(move || {
        clicks_clone.fetch_add(1, Ordering::SeqCst);
    });
    let stale = node.add_long_click_listener(|| {});
    assert!(node.remove_long_click_listener(stale));

    assert!(!node.remove_long_click_listener(stale));
    assert!(!node.remove_click_listener(stale));
    assert!(!node.remove_dom_event_listener("x", stale));
    assert_eq!(node.call_click(), 1);

    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dom_events_carry_payload() {
    init_tracing();
    let node = DomNode::new(4, None, 0);
    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    node.add_dom_event_listener("change", move |event: &DomEvent| {
        received_clone
            .lock()
            .push((event.target(), event.value().and_then(DomValue::as_str).map(str::to_owned)));
    });

    let event = DomEvent::with_value("change", 4, DomValue::from("hello"));
    assert_eq!(node.on_dom_node_state_change(&event), 1);
    assert_eq!(*received.lock(), vec![(4, Some("hello".to_string()))]);
}

#[test]
fn test_call_function_round_trip_through_registry() {
    init_tracing();
    let (registry, calls) = NodeRegistry::with_call_channel();
    let registry = Arc::new(registry);
    let node = DomNode::builder(5).manager(&registry).build();
    registry.register(&node).unwrap();

    let results = Arc::new(Mutex::new(Vec::new()));
    let first_results = results.clone();
    let second_results = results.clone();
    let first: CallFunctionCallback = Arc::new(move |value: &DomValue| {
        first_results.lock().push(("first", value.clone()));
    });
    let second: CallFunctionCallback = Arc::new(move |value: &DomValue| {
        second_results.lock().push(("second", value.clone()));
    });

    let params = style(&[("x", DomValue::from(1))]);
    node.call_function("foo", &params, first).unwrap();
    node.call_function("foo", &StyleMap::new(), second.clone()).unwrap();
    assert!(Arc::ptr_eq(&node.get_callback("foo").unwrap(), &second));

    let sent: Vec<_> = calls.try_iter().collect();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].params.get("x").and_then(|v| v.as_f64()), Some(1.0));

    assert!(registry.deliver_call_result(5, "foo", &DomValue::from(true)));
    assert!(!registry.deliver_call_result(5, "bar", &DomValue::Null));
    assert!(!registry.deliver_call_result(6, "foo", &DomValue::Null));
    assert_eq!(*results.lock(), vec![("second", DomValue::from(true))]);
}

#[test]
fn test_transport_failure_keeps_callback() {
    init_tracing();
    let (registry, calls) = NodeRegistry::with_call_channel();
    drop(calls);
    let registry = Arc::new(registry);
    let node = DomNode::builder(5).manager(&registry).build();

    let result = node.call_function("foo", &StyleMap::new(), Arc::new(|_: &DomValue| {}));
    assert!(matches!(result, Err(DomError::CallDispatch { node: 5, .. })));
    assert!(node.get_callback("foo").is_some());
}

#[derive(Default)]
struct RecordingManager {
    nodes: NodeRegistry,
    events: Mutex<Vec<String>>,
}

impl DomManager for RecordingManager {
    fn node(&self, id: u32) -> Option<Arc<DomNode>> {
        self.nodes.node(id)
    }

    fn on_child_inserted(&self, parent: &DomNode, child: &Arc<DomNode>, index: usize) {
        self.events
            .lock()
            .push(format!("insert {} under {} at {index}", child.id(), parent.id()));
    }

    fn on_child_removed(&self, parent: &DomNode, child: &Arc<DomNode>, index: usize) {
        self.events
            .lock()
            .push(format!("remove {} from {} at {index}", child.id(), parent.id()));
    }

    fn call_function(&self, node_id: u32, name: &str, params: &StyleMap) -> DomResult<()> {
        self.nodes.call_function(node_id, name, params)
    }
}

#[test]
fn test_manager_hooks_and_inheritance() {
    init_tracing();
    let manager = Arc::new(RecordingManager::default());
    let root = DomNode::builder(1).manager(&manager).build();
    let child = DomNode::new(2, None, 0);
    let grandchild = DomNode::new(3, None, 0);
    child.add_child_at(grandchild.clone(), 0).unwrap();

    root.add_child_at(child.clone(), 5).unwrap();
    assert!(grandchild.manager().is_some());
    root.remove_child_at(0).unwrap();

    assert_eq!(
        *manager.events.lock(),
        vec!["insert 2 under 1 at 0".to_string(), "remove 2 from 1 at 0".to_string()]
    );
}

#[test]
fn test_dump_tree() {
    init_tracing();
    let root = DomNode::builder(1).tag_name("View").build();
    root.add_child_at(DomNode::builder(2).tag_name("Text").build(), 0)
        .unwrap();
    let dump = root.dump_tree();
    assert!(dump.starts_with("View #1"));
    assert!(dump.contains("Text #2"));
}
