//! Driving a layout pass over a subtree and copying its results back.

use taffy::Style;

use super::{AvailableSize, LayoutEngine, LayoutOutputs};
use crate::error::DomResult;
use crate::listener::{EventChannel, EventPayload, LayoutEvent};
use crate::logging::{PerfSpan, targets};
use crate::node::DomNode;

impl DomNode {
    /// Rebuild this node's layout constraints from its style map.
    ///
    /// Returns whether the constraints changed. Calling it again with the same
    /// style map changes nothing.
    pub fn parse_layout_style_info(&self) -> bool {
        let style = self.style();
        let changed = self.layout.lock().apply_style_map(&style);
        if changed {
            tracing::trace!(target: targets::LAYOUT, id = self.id(), "layout constraints updated");
        }
        changed
    }

    /// The constraints the layout engine will see for this node.
    pub fn layout_style(&self) -> Style {
        self.layout.lock().style().clone()
    }

    /// Force the layout width, bypassing the style's `width`.
    pub fn set_layout_width(&self, width: f32) {
        self.layout.lock().set_width(width);
    }

    /// Force the layout height, bypassing the style's `height`.
    pub fn set_layout_height(&self, height: f32) {
        self.layout.lock().set_height(height);
    }

    /// Force both layout dimensions.
    pub fn set_size(&self, width: f32, height: f32) {
        let mut layout = self.layout.lock();
        layout.set_width(width);
        layout.set_height(height);
    }

    /// Width and height from the last layout pass.
    pub fn size(&self) -> (f32, f32) {
        let result = self.layout_result();
        (result.width, result.height)
    }

    /// Lay out the subtree rooted here using the engine's default available size.
    pub fn do_layout<E: LayoutEngine + ?Sized>(&self, engine: &mut E) -> DomResult<()> {
        let available = engine.default_available();
        self.do_layout_with(engine, available)
    }

    /// Lay out the subtree rooted here within `available`.
    ///
    /// On failure no node's layout result changes and no listener fires.
    pub fn do_layout_with<E: LayoutEngine + ?Sized>(
        &self,
        engine: &mut E,
        available: AvailableSize,
    ) -> DomResult<()> {
        let _span = PerfSpan::new("do_layout");
        tracing::debug!(target: targets::LAYOUT, root = self.id(), ?available, "layout pass");

        let outputs = engine.solve(self, available).inspect_err(|error| {
            tracing::warn!(target: targets::LAYOUT, root = self.id(), %error, "layout pass failed");
        })?;

        self.commit_layout_outputs(&outputs);
        self.transfer_layout_outputs_recursive();
        Ok(())
    }

    /// Store solved boxes on the bindings of this subtree.
    ///
    /// A pass root with a parent was placed by that parent, so it keeps its
    /// current position and takes only its size and insets from the solve.
    fn commit_layout_outputs(&self, outputs: &LayoutOutputs) {
        if let Some(solved) = outputs.get(&self.id()) {
            let mut result = *solved;
            if self.parent().is_some() {
                let placed = self.layout_result();
                result.left = placed.left;
                result.top = placed.top;
            }
            self.layout.lock().set_solved(result);
        }
        for child in self.children() {
            child.commit_solved_boxes(outputs);
        }
    }

    fn commit_solved_boxes(&self, outputs: &LayoutOutputs) {
        if let Some(result) = outputs.get(&self.id()) {
            self.layout.lock().set_solved(*result);
        }
        for child in self.children() {
            child.commit_solved_boxes(outputs);
        }
    }

    /// Copy each binding's solved box into the node's layout result.
    ///
    /// Children are handled before their parent. Layout listeners fire once
    /// per node, and only for nodes whose result changed.
    pub fn transfer_layout_outputs_recursive(&self) {
        for child in self.children() {
            child.transfer_layout_outputs_recursive();
        }

        let Some(result) = self.layout.lock().solved() else {
            return;
        };
        let changed = {
            let mut data = self.data.write();
            let changed = data.layout != result;
            data.layout = result;
            changed
        };
        if changed {
            self.listeners.dispatch(
                &EventChannel::Layout(LayoutEvent::OnLayout),
                &EventPayload::Layout(&result),
            );
        }
    }
}
