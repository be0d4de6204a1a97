//! Error types for the chat core.

/// Errors returned by [`Broadcaster`](crate::Broadcaster) operations.
///
/// Only invalid input is ever surfaced to a caller. Dead subscribers are
/// handled internally and never produce an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A required message field was absent.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },
}
