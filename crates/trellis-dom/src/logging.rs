//! Logging and debugging facilities for the node model.
//!
//! This module provides:
//! - Target names for filtering `tracing` output by subsystem
//! - Debug visualization for node subtrees
//! - Performance spans around layout solves
//!
//! # Tracing Integration
//!
//! Trellis only emits `tracing` events. To see them, install a subscriber in
//! the embedding application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("trellis_dom::layout=debug")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! ```
//! use trellis_dom::DomNode;
//! use trellis_dom::logging::NodeTreeDebug;
//!
//! let root = DomNode::builder(1).tag_name("View").build();
//! let text = DomNode::builder(2).tag_name("Text").build();
//! root.add_child_at(text, 0).unwrap();
//!
//! let output = NodeTreeDebug::new().format_subtree(&root);
//! assert!(output.contains("Text"));
//! ```

use crate::node::DomNode;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Node structure and properties.
    pub const NODE: &str = "trellis_dom::node";
    /// Listener registration and dispatch.
    pub const LISTENER: &str = "trellis_dom::listener";
    /// Style parsing, solving and result propagation.
    pub const LAYOUT: &str = "trellis_dom::layout";
    /// Remote function calls.
    pub const CALLBACK: &str = "trellis_dom::callback";
    /// Tree-manager registry.
    pub const MANAGER: &str = "trellis_dom::manager";
    /// Performance spans.
    pub const PERF: &str = "trellis_dom::perf";
}

/// Style options for subtree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line prefixes.
    Compact,
}

/// Configuration for subtree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node ids.
    pub show_ids: bool,
    /// Whether to show view names next to tag names.
    pub show_view_names: bool,
    /// Whether to show the last layout result.
    pub show_layout: bool,
    /// Whether to list style keys under each node.
    pub show_styles: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_view_names: true,
            show_layout: true,
            show_styles: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_styles: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_view_names: false,
            show_layout: false,
            show_styles: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing node subtrees.
#[derive(Debug, Clone, Default)]
pub struct NodeTreeDebug {
    options: TreeFormatOptions,
}

impl NodeTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the subtree rooted at `root`.
    pub fn format_subtree(&self, root: &DomNode) -> String {
        let mut output = String::new();
        self.format_subtree_into(root, 0, true, &mut output);
        output
    }

    fn format_subtree_into(&self, node: &DomNode, depth: usize, is_last: bool, output: &mut String) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        output.push_str(&self.build_prefix(depth, is_last));

        let tag = node.tag_name();
        output.push_str(if tag.is_empty() { "(untagged)" } else { tag.as_str() });

        if self.options.show_view_names {
            let view = node.view_name();
            if !view.is_empty() && view != tag {
                output.push_str(&format!(" <{view}>"));
            }
        }

        if self.options.show_ids {
            output.push_str(&format!(" #{}", node.id()));
        }

        if self.options.show_layout {
            let layout = node.layout_result();
            output.push_str(&format!(
                " ({}, {} {}x{})",
                layout.left, layout.top, layout.width, layout.height
            ));
        }

        output.push('\n');

        if self.options.show_styles {
            let mut keys: Vec<String> = node.style().into_keys().collect();
            keys.sort();
            let prefix = self.build_property_prefix(depth);
            for key in keys {
                output.push_str(&format!("{prefix}  .{key}\n"));
            }
        }

        let children = node.children();
        let child_count = children.len();
        for (i, child) in children.iter().enumerate() {
            self.format_subtree_into(child, depth + 1, i + 1 == child_count, output);
        }
    }

    /// Build the prefix string for a tree node.
    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }

    fn build_property_prefix(&self, depth: usize) -> String {
        let branch = match self.options.style {
            TreeStyle::Ascii => "|",
            TreeStyle::Unicode => "\u{2502}",
            TreeStyle::Compact => "",
        };

        let mut prefix = String::new();
        for _ in 0..depth {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to time layout solves.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use trellis_value::DomValue;

    use super::*;

    fn sample_tree() -> Arc<DomNode> {
        let root = DomNode::builder(1).tag_name("View").view_name("View").build();
        let mut style = HashMap::new();
        style.insert("color".to_string(), Arc::new(DomValue::from("red")));
        let text = DomNode::builder(2)
            .tag_name("Text")
            .view_name("RichText")
            .style(style)
            .build();
        let image = DomNode::builder(3).tag_name("Image").build();
        root.add_child_at(text, 0).unwrap();
        root.add_child_at(image, 1).unwrap();
        root
    }

    #[test]
    fn test_tree_format_hierarchy() {
        let output = NodeTreeDebug::new().format_subtree(&sample_tree());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("View #1"));
        assert!(lines[1].contains("Text <RichText> #2"));
        assert!(lines[2].starts_with("\u{2514}\u{2500}\u{2500} Image #3"));
    }

    #[test]
    fn test_tree_format_minimal() {
        let output = NodeTreeDebug::with_options(TreeFormatOptions::minimal()).format_subtree(&sample_tree());
        assert!(output.contains("Text"));
        assert!(!output.contains('#'));
        assert!(!output.contains("RichText"));
    }

    #[test]
    fn test_tree_format_detailed_lists_styles() {
        let output = NodeTreeDebug::with_options(TreeFormatOptions::detailed()).format_subtree(&sample_tree());
        assert!(output.contains(".color"));
    }

    #[test]
    fn test_tree_format_max_depth() {
        let options = TreeFormatOptions {
            max_depth: Some(0),
            style: TreeStyle::Ascii,
            ..Default::default()
        };
        let output = NodeTreeDebug::with_options(options).format_subtree(&sample_tree());
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }
}
