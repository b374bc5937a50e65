use super::{AvailableSize, LayoutOutputs};
use crate::error::DomResult;
use crate::node::DomNode;

/// A constraint solver that computes boxes for a subtree.
///
/// Implementations read each node's bound constraints through
/// [`DomNode::layout_style`] and walk the child sequence themselves. They
/// must not mutate the tree; results are returned and committed by the
/// caller only when the whole solve succeeded.
pub trait LayoutEngine {
    /// Solve the subtree rooted at `root` within `available`.
    fn solve(&mut self, root: &DomNode, available: AvailableSize) -> DomResult<LayoutOutputs>;

    /// Available size used by [`DomNode::do_layout`].
    fn default_available(&self) -> AvailableSize {
        AvailableSize::UNBOUNDED
    }
}
