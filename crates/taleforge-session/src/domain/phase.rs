//! Session phases and failure kinds.

use std::fmt;

use serde::Serialize;

/// Loading message shown while the theme is submitted.
pub const DEFAULT_LOADING_MESSAGE: &str = "Crafting your adventure...";
/// Loading message shown once the service reports the job as processing.
pub const PROCESSING_MESSAGE: &str = "Weaving the narrative threads...";
/// Loading message shown while the finished story is downloaded.
pub const FETCHING_STORY_MESSAGE: &str = "Loading your story...";

/// Phase of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Waiting for the player to pick a theme.
    SelectingTheme,
    /// The theme is being submitted to the service.
    Submitting,
    /// The generation job is being polled.
    Polling,
    /// A story is loaded and being played.
    Playing,
    /// Generation or loading failed.
    Failed,
}

impl SessionPhase {
    /// Whether the phase shows a loading screen.
    #[must_use]
    pub fn is_loading(self) -> bool {
        matches!(self, Self::Submitting | Self::Polling)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SelectingTheme => "selecting_theme",
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::Playing => "playing",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a session ended up in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The service rejected the theme or could not be reached on submission.
    CreateFailed,
    /// A status check failed in transport or at the service.
    PollFailed,
    /// The job itself reported failure.
    GenerationFailed,
    /// The job completed without a usable story.
    InvalidCompletion,
    /// Navigation referenced a node missing from the story.
    NodeNotFound,
}

impl FailureKind {
    /// Message shown when the service supplied no detail.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            Self::CreateFailed => "Failed to create story. Please try again.",
            Self::PollFailed => "Failed to check story status",
            Self::GenerationFailed => "Failed to generate story",
            Self::InvalidCompletion => "Story generation finished without a readable story",
            Self::NodeNotFound => "The story refers to a passage that does not exist",
        }
    }
}

/// Recorded failure of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// Human-readable message.
    pub message: String,
}

impl SessionFailure {
    /// Builds a failure, preferring `detail` over the kind's default message.
    #[must_use]
    pub fn new(kind: FailureKind, detail: Option<&str>) -> Self {
        let message = detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| kind.default_message())
            .to_owned();
        Self { kind, message }
    }
}
