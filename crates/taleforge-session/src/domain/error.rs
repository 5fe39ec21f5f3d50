//! Session error types.

use taleforge_core::error::ThemeError;
use taleforge_navigator::domain::error::NavigationError;
use thiserror::Error;

use super::phase::{FailureKind, SessionFailure, SessionPhase};

/// Errors surfaced by the session controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `start` was called with a blank theme.
    #[error("theme must not be empty")]
    EmptyTheme,

    /// An intent that the current phase does not accept.
    #[error("cannot {intent} while the session is {phase}")]
    InvalidTransition {
        /// The rejected intent.
        intent: &'static str,
        /// The phase the session was in.
        phase: SessionPhase,
    },

    /// The service rejected the theme or was unreachable on submission.
    #[error("{0}")]
    CreateFailed(String),

    /// A status check failed.
    #[error("{0}")]
    PollFailed(String),

    /// The job reported failure.
    #[error("{0}")]
    GenerationFailed(String),

    /// The job completed without a usable story.
    #[error("{0}")]
    InvalidCompletion(String),

    /// Navigation referenced a node missing from the story.
    #[error("{0}")]
    NodeNotFound(String),

    /// `start_with_theme` named a theme that is not in the catalog.
    #[error("unknown theme: {0}")]
    UnknownTheme(String),

    /// A story intent arrived before any story was loaded.
    #[error("no story is loaded")]
    NoStory,
}

impl SessionError {
    /// The failure kind this error corresponds to, if it is a session failure.
    #[must_use]
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::CreateFailed(_) => Some(FailureKind::CreateFailed),
            Self::PollFailed(_) => Some(FailureKind::PollFailed),
            Self::GenerationFailed(_) => Some(FailureKind::GenerationFailed),
            Self::InvalidCompletion(_) => Some(FailureKind::InvalidCompletion),
            Self::NodeNotFound(_) => Some(FailureKind::NodeNotFound),
            Self::EmptyTheme
            | Self::UnknownTheme(_)
            | Self::InvalidTransition { .. }
            | Self::NoStory => None,
        }
    }
}

impl From<&SessionFailure> for SessionError {
    fn from(failure: &SessionFailure) -> Self {
        let message = failure.message.clone();
        match failure.kind {
            FailureKind::CreateFailed => Self::CreateFailed(message),
            FailureKind::PollFailed => Self::PollFailed(message),
            FailureKind::GenerationFailed => Self::GenerationFailed(message),
            FailureKind::InvalidCompletion => Self::InvalidCompletion(message),
            FailureKind::NodeNotFound => Self::NodeNotFound(message),
        }
    }
}

impl From<NavigationError> for SessionError {
    fn from(err: NavigationError) -> Self {
        match err {
            NavigationError::NotInitialized => Self::NoStory,
            NavigationError::NodeNotFound(node_id) => Self::NodeNotFound(format!(
                "{}: {node_id}",
                FailureKind::NodeNotFound.default_message()
            )),
        }
    }
}

impl From<ThemeError> for SessionError {
    fn from(err: ThemeError) -> Self {
        match err {
            ThemeError::EmptyCustomTheme => Self::EmptyTheme,
            ThemeError::UnknownTheme(id) => Self::UnknownTheme(id),
        }
    }
}
