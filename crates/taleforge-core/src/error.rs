//! Error types shared across the Taleforge crates.

use thiserror::Error;

/// Failure reported at the `StoryGenerationService` boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("service rejected the request with status {status}")]
    Rejected {
        /// HTTP-like status code returned by the service.
        status: u16,
        /// Service-supplied detail message, if the body carried one.
        detail: Option<String>,
    },

    /// The request never produced a response (connection, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("could not decode service response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Returns the human-readable detail supplied by the service, if any.
    ///
    /// Only rejections carry a service-authored message; transport and decode
    /// failures are local and yield `None`.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { detail, .. } => detail.as_deref().filter(|d| !d.trim().is_empty()),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

/// A story graph that violates its structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoryError {
    /// The root node id is not present in the node map.
    #[error("root node {0} is missing from the story")]
    MissingRoot(String),

    /// An option points at a node that does not exist.
    #[error("option on node {node_id} targets missing node {target_node_id}")]
    DanglingOption {
        /// Node carrying the broken option.
        node_id: String,
        /// The unresolved target.
        target_node_id: String,
    },

    /// Two nodes share the same id.
    #[error("duplicate node id {0}")]
    DuplicateNode(String),

    /// A node is filed under a key other than its own id.
    #[error("node {node_id} is stored under key {key}")]
    MismatchedKey {
        /// The key the node was stored under.
        key: String,
        /// The node's own id.
        node_id: String,
    },
}

/// A theme selection that cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThemeError {
    /// The id is not one of the predefined themes.
    #[error("unknown theme {0}")]
    UnknownTheme(String),

    /// A custom theme is blank after trimming.
    #[error("custom theme must not be empty")]
    EmptyCustomTheme,
}
