use taffy::{Dimension, Style};
use trellis_value::DomValue;

use super::LayoutResult;
use super::style::{base_style, build_style};
use crate::style::StyleMap;

/// A node's binding to the layout solver.
///
/// Holds the constraints derived from the style map, any per-axis size
/// overrides, and the box from the most recent successful solve.
///
/// An override set through [`LayoutNode::set_width`] or
/// [`LayoutNode::set_height`] survives re-parsing until the matching style key
/// (`width` / `height`) changes value.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    style: Style,
    width_override: Option<f32>,
    height_override: Option<f32>,
    style_width: Option<DomValue>,
    style_height: Option<DomValue>,
    solved: Option<LayoutResult>,
}

impl Default for LayoutNode {
    fn default() -> Self {
        Self {
            style: base_style(),
            width_override: None,
            height_override: None,
            style_width: None,
            style_height: None,
            solved: None,
        }
    }
}

impl LayoutNode {
    /// Create a binding with base constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the constraints from `map`. Returns whether they changed.
    pub fn apply_style_map(&mut self, map: &StyleMap) -> bool {
        let mut style = build_style(map);

        let width = map.get("width").map(|value| DomValue::clone(value));
        if width != self.style_width {
            self.width_override = None;
            self.style_width = width;
        }
        let height = map.get("height").map(|value| DomValue::clone(value));
        if height != self.style_height {
            self.height_override = None;
            self.style_height = height;
        }

        if let Some(width) = self.width_override {
            style.size.width = Dimension::Length(width);
        }
        if let Some(height) = self.height_override {
            style.size.height = Dimension::Length(height);
        }

        let changed = style != self.style;
        self.style = style;
        changed
    }

    /// Force the width, bypassing the style-derived constraint.
    pub fn set_width(&mut self, width: f32) {
        self.width_override = Some(width);
        self.style.size.width = Dimension::Length(width);
    }

    /// Force the height, bypassing the style-derived constraint.
    pub fn set_height(&mut self, height: f32) {
        self.height_override = Some(height);
        self.style.size.height = Dimension::Length(height);
    }

    /// Current width override.
    pub fn width_override(&self) -> Option<f32> {
        self.width_override
    }

    /// Current height override.
    pub fn height_override(&self) -> Option<f32> {
        self.height_override
    }

    /// The bound constraints.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Box from the last committed solve.
    pub fn solved(&self) -> Option<LayoutResult> {
        self.solved
    }

    pub(crate) fn set_solved(&mut self, result: LayoutResult) {
        self.solved = Some(result);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn width_map(width: f32) -> StyleMap {
        let mut map = StyleMap::new();
        map.insert("width".to_string(), Arc::new(DomValue::from(width)));
        map
    }

    #[test]
    fn test_reapply_is_idempotent() {
        let mut node = LayoutNode::new();
        let map = width_map(50.0);
        assert!(node.apply_style_map(&map));
        assert!(!node.apply_style_map(&map));
    }

    #[test]
    fn test_override_survives_unchanged_style() {
        let mut node = LayoutNode::new();
        let map = width_map(50.0);
        node.apply_style_map(&map);
        node.set_width(100.0);

        node.apply_style_map(&map);
        assert_eq!(node.style().size.width, Dimension::Length(100.0));
        assert_eq!(node.width_override(), Some(100.0));
    }

    #[test]
    fn test_override_replaced_when_style_key_changes() {
        let mut node = LayoutNode::new();
        node.apply_style_map(&width_map(50.0));
        node.set_width(100.0);

        assert!(node.apply_style_map(&width_map(70.0)));
        assert_eq!(node.style().size.width, Dimension::Length(70.0));
        assert_eq!(node.width_override(), None);
    }

    #[test]
    fn test_height_override_without_style_key() {
        let mut node = LayoutNode::new();
        node.set_height(30.0);
        assert!(!node.apply_style_map(&StyleMap::new()));
        assert_eq!(node.style().size.height, Dimension::Length(30.0));
    }
}
