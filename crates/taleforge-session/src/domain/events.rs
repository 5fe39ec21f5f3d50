//! Session events published to presentation layers.

use serde::Serialize;
use uuid::Uuid;

use super::phase::{FailureKind, SessionPhase};

/// Something observable changed in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session moved to another phase.
    PhaseChanged {
        /// Session the change belongs to.
        session_id: Uuid,
        /// Phase left.
        from: SessionPhase,
        /// Phase entered.
        to: SessionPhase,
    },
    /// The advisory loading message changed.
    LoadingMessageChanged {
        /// Session the change belongs to.
        session_id: Uuid,
        /// The new message.
        message: String,
    },
    /// The session failed.
    Failed {
        /// Session the failure belongs to.
        session_id: Uuid,
        /// Failure category.
        kind: FailureKind,
        /// Human-readable message.
        message: String,
    },
    /// The player moved within the story.
    Navigated {
        /// Session the move belongs to.
        session_id: Uuid,
        /// Node the player is on after the move.
        node_id: String,
    },
}
