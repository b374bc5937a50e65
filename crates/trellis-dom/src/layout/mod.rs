//! Layout support for the node tree.
//!
//! Layout runs in three steps:
//!
//! 1. **Parse**: each node turns its style map into solver constraints held in
//!    its [`LayoutNode`] binding ([`DomNode::parse_layout_style_info`]).
//! 2. **Solve**: a [`LayoutEngine`] computes a box for every node of a subtree.
//! 3. **Transfer**: the boxes are copied into each node's [`LayoutResult`] in
//!    post-order and layout listeners fire for the nodes that changed.
//!
//! The default engine is [`TaffyLayoutEngine`], backed by the `taffy` flexbox
//! solver.
//!
//! [`DomNode::parse_layout_style_info`]: crate::DomNode::parse_layout_style_info

use std::collections::HashMap;

mod engine;
mod node;
mod propagate;
mod style;
mod taffy_engine;

pub use engine::LayoutEngine;
pub use node::LayoutNode;
pub use style::build_style;
pub(crate) use style::is_layout_key;
pub use taffy_engine::{LayoutConfig, TaffyLayoutEngine};

/// Per-edge insets such as padding or border widths.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeInsets {
    /// Left inset.
    pub left: f32,
    /// Top inset.
    pub top: f32,
    /// Right inset.
    pub right: f32,
    /// Bottom inset.
    pub bottom: f32,
}

/// Geometry of a node after a layout pass, relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutResult {
    /// Horizontal offset from the parent's origin.
    pub left: f32,
    /// Vertical offset from the parent's origin.
    pub top: f32,
    /// Border-box width.
    pub width: f32,
    /// Border-box height.
    pub height: f32,
    /// Resolved padding.
    pub padding: EdgeInsets,
    /// Resolved border widths.
    pub border: EdgeInsets,
}

impl LayoutResult {
    /// Create a result with the given box and no insets.
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
            ..Default::default()
        }
    }
}

/// Space available to the root of a layout pass.
///
/// `None` on an axis means the root may size itself to its content.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AvailableSize {
    /// Available width.
    pub width: Option<f32>,
    /// Available height.
    pub height: Option<f32>,
}

impl AvailableSize {
    /// No bound on either axis.
    pub const UNBOUNDED: Self = Self {
        width: None,
        height: None,
    };

    /// A definite size on both axes.
    pub fn definite(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }
}

/// Solved boxes keyed by node id.
pub type LayoutOutputs = HashMap<u32, LayoutResult>;
