//! Error types for value conversion.

/// Result type alias for value operations.
pub type ValueResult<T> = std::result::Result<T, ValueError>;

/// Errors that can occur while converting or parsing values.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// The value held a different variant than the one requested.
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// The variant that was requested.
        expected: &'static str,
        /// The variant that was found.
        got: &'static str,
    },

    /// JSON text could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[source] serde_json::Error),
}
