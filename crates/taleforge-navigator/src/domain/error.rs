//! Navigation error types.

use thiserror::Error;

/// Errors raised while walking a story graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// No story has been loaded into the navigator.
    #[error("no story is loaded")]
    NotInitialized,

    /// A referenced node id is absent from the story. The story is malformed.
    #[error("story node not found: {0}")]
    NodeNotFound(String),
}
