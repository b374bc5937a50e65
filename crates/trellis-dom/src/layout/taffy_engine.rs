//! Layout engine backed by the `taffy` flexbox solver.
//!
//! Each solve builds a fresh `TaffyTree` mirroring the subtree, computes it,
//! and reads the boxes back out. Nothing is cached between solves, so the
//! engine never goes stale when nodes are inserted or removed.

use taffy::{AvailableSpace, Layout, NodeId, Rect, Size, TaffyError, TaffyTree};

use super::{AvailableSize, EdgeInsets, LayoutEngine, LayoutOutputs, LayoutResult};
use crate::error::{DomError, DomResult};
use crate::logging::{PerfSpan, targets};
use crate::node::DomNode;

/// Settings for [`TaffyLayoutEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Round boxes to whole pixels.
    pub rounding: bool,
    /// Available size used by [`DomNode::do_layout`].
    pub viewport: AvailableSize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rounding: true,
            viewport: AvailableSize::UNBOUNDED,
        }
    }
}

impl LayoutConfig {
    /// Enable or disable pixel rounding.
    pub fn with_rounding(mut self, rounding: bool) -> Self {
        self.rounding = rounding;
        self
    }

    /// Set the default available size.
    pub fn with_viewport(mut self, viewport: AvailableSize) -> Self {
        self.viewport = viewport;
        self
    }
}

/// The default [`LayoutEngine`].
#[derive(Debug, Clone, Default)]
pub struct TaffyLayoutEngine {
    config: LayoutConfig,
}

impl TaffyLayoutEngine {
    /// Create an engine with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given settings.
    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// The engine's settings.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }
}

impl LayoutEngine for TaffyLayoutEngine {
    fn solve(&mut self, root: &DomNode, available: AvailableSize) -> DomResult<LayoutOutputs> {
        let _span = PerfSpan::new("taffy_solve");
        let available = to_available_space(root.id(), available)?;

        let mut tree: TaffyTree<()> = TaffyTree::new();
        if !self.config.rounding {
            tree.disable_rounding();
        }

        let mut ids = Vec::new();
        let taffy_root = build_subtree(&mut tree, root, &mut ids).map_err(|e| engine_error(root, e))?;
        tree.compute_layout(taffy_root, available)
            .map_err(|e| engine_error(root, e))?;

        let mut outputs = LayoutOutputs::with_capacity(ids.len());
        for (node_id, taffy_id) in ids {
            let layout = tree.layout(taffy_id).map_err(|e| engine_error(root, e))?;
            outputs.insert(node_id, to_layout_result(layout));
        }

        tracing::debug!(target: targets::LAYOUT, root = root.id(), nodes = outputs.len(), "solved subtree");
        Ok(outputs)
    }

    fn default_available(&self) -> AvailableSize {
        self.config.viewport
    }
}

fn build_subtree(
    tree: &mut TaffyTree<()>,
    node: &DomNode,
    ids: &mut Vec<(u32, NodeId)>,
) -> Result<NodeId, TaffyError> {
    let children = node
        .children()
        .iter()
        .map(|child| build_subtree(tree, child, ids))
        .collect::<Result<Vec<_>, _>>()?;
    let taffy_id = tree.new_with_children(node.layout_style(), &children)?;
    ids.push((node.id(), taffy_id));
    Ok(taffy_id)
}

fn to_available_space(root: u32, available: AvailableSize) -> DomResult<Size<AvailableSpace>> {
    let axis = |value: Option<f32>| match value {
        None => Ok(AvailableSpace::MaxContent),
        Some(v) if v.is_finite() && v >= 0.0 => Ok(AvailableSpace::Definite(v)),
        Some(v) => Err(DomError::layout(root, format!("invalid available size {v}"))),
    };
    Ok(Size {
        width: axis(available.width)?,
        height: axis(available.height)?,
    })
}

fn to_layout_result(layout: &Layout) -> LayoutResult {
    LayoutResult {
        left: layout.location.x,
        top: layout.location.y,
        width: layout.size.width,
        height: layout.size.height,
        padding: to_insets(layout.padding),
        border: to_insets(layout.border),
    }
}

fn to_insets(rect: Rect<f32>) -> EdgeInsets {
    EdgeInsets {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}

fn engine_error(root: &DomNode, error: TaffyError) -> DomError {
    tracing::warn!(target: targets::LAYOUT, root = root.id(), %error, "layout solve failed");
    DomError::layout(root.id(), error.to_string())
}
