//! Error types for the DOM node model.
//!
//! Expected absence (an index past the end, an unknown listener handle, a
//! parent that was already dropped) is never an error; those operations
//! return `Option` or `bool`. [`DomError`] is reserved for rejected
//! operations and engine or transport failures.

/// Result type alias for DOM operations.
pub type DomResult<T> = std::result::Result<T, DomError>;

/// Errors that can occur in the DOM node model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Inserting the node would make it its own ancestor.
    #[error("node {child} cannot be inserted under its own descendant {parent}")]
    CircularParentage {
        /// The would-be parent.
        parent: u32,
        /// The node being inserted.
        child: u32,
    },

    /// The node is still attached to another parent.
    #[error("node {child} is already attached to parent {parent}")]
    AlreadyAttached {
        /// The node being inserted.
        child: u32,
        /// Its current parent.
        parent: u32,
    },

    /// Another node with the same id already exists in the tree.
    #[error("duplicate node id {0}")]
    DuplicateId(u32),

    /// The layout engine could not solve the subtree.
    #[error("layout failed for node {node}: {message}")]
    Layout {
        /// Root of the subtree being solved.
        node: u32,
        /// Engine-provided description.
        message: String,
    },

    /// The remote-call transport rejected the call.
    #[error("failed to dispatch call '{name}' for node {node}: {message}")]
    CallDispatch {
        /// Node issuing the call.
        node: u32,
        /// Function name.
        name: String,
        /// Transport-provided description.
        message: String,
    },
}

impl DomError {
    /// Create a layout error.
    pub fn layout(node: u32, message: impl Into<String>) -> Self {
        Self::Layout {
            node,
            message: message.into(),
        }
    }

    /// Create a call dispatch error.
    pub fn call_dispatch(node: u32, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CallDispatch {
            node,
            name: name.into(),
            message: message.into(),
        }
    }
}
