//! Query handlers for the Session context.
//!
//! Builds the read-only projection a presentation layer renders from.

use serde::Serialize;
use taleforge_navigator::application::query_handlers::{NodeView, current_node_view};
use uuid::Uuid;

use crate::domain::phase::{FailureKind, SessionPhase};
use crate::domain::state::SessionState;

/// Read-only view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    /// Identifier of the current attempt.
    pub session_id: Uuid,
    /// Current phase.
    pub phase: SessionPhase,
    /// Theme of the current attempt.
    pub theme: Option<String>,
    /// Loading screen message, while submitting or polling.
    pub loading_message: Option<String>,
    /// Failure category, while failed.
    pub error_kind: Option<FailureKind>,
    /// Failure message, while failed.
    pub error_message: Option<String>,
    /// Generation job id, once accepted.
    pub job_id: Option<String>,
    /// Title of the loaded story.
    pub story_title: Option<String>,
    /// The node the player is on, while playing.
    pub current_node: Option<NodeView>,
    /// Distinct nodes reached.
    pub discovered_count: usize,
    /// Nodes in the story.
    pub total_count: usize,
    /// `discovered_count / total_count`.
    pub progress_fraction: f64,
    /// Whether going back would move.
    pub can_go_back: bool,
    /// Length of the path taken.
    pub history_len: usize,
    /// Whether a visual transition holds the navigation lock.
    pub is_transitioning: bool,
}

/// Projects a session state into a `SessionView`.
#[must_use]
pub fn session_view(state: &SessionState) -> SessionView {
    let navigator = state.navigator();
    let failure = state.failure();

    SessionView {
        session_id: state.session_id,
        phase: state.phase(),
        theme: state.theme.clone(),
        loading_message: state
            .phase()
            .is_loading()
            .then(|| state.loading_message.clone()),
        error_kind: failure.map(|f| f.kind),
        error_message: failure.map(|f| f.message.clone()),
        job_id: state.job().map(|job| job.id.clone()),
        story_title: state.story.as_ref().map(|story| story.title.clone()),
        current_node: current_node_view(navigator).ok(),
        discovered_count: navigator.discovered_count(),
        total_count: navigator.total_count(),
        progress_fraction: navigator.progress_fraction(),
        can_go_back: navigator.can_go_back(),
        history_len: navigator.history_len(),
        is_transitioning: navigator.is_transitioning(),
    }
}
