//! The session state machine.
//!
//! `SessionState` is synchronous and performs no I/O. The controller calls it
//! before and after every service request; each call either applies a
//! transition or reports that the response it carries is stale.
//!
//! Every phase change bumps `epoch`. A service call captures the epoch when it
//! is issued and hands it back with the response, so a response that arrives
//! after the session moved on is discarded instead of applied.

use std::sync::Arc;

use taleforge_core::clock::Clock;
use taleforge_core::error::ServiceError;
use taleforge_core::job::{Job, JobStatus, JobStatusReport, JobTicket};
use taleforge_core::story::Story;
use taleforge_navigator::domain::navigator::StoryNavigator;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::SessionError;
use super::events::SessionEvent;
use super::phase::{
    DEFAULT_LOADING_MESSAGE, FETCHING_STORY_MESSAGE, FailureKind, PROCESSING_MESSAGE,
    SessionFailure, SessionPhase,
};

/// What the controller should do after a status report was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    /// The job is not terminal yet; keep polling.
    Continue,
    /// The job completed; download this story next.
    FetchStory(String),
    /// The session failed.
    Failed,
    /// The response was stale and ignored.
    Discarded,
}

/// State of one story generation session.
#[derive(Debug)]
pub struct SessionState {
    /// Identifier of the current attempt, renewed on every `start`.
    pub(crate) session_id: Uuid,
    /// Current phase.
    pub(crate) phase: SessionPhase,
    /// Bumped on every phase change.
    pub(crate) epoch: u64,
    /// Theme of the current attempt.
    pub(crate) theme: Option<String>,
    /// The generation job, once accepted.
    pub(crate) job: Option<Job>,
    /// The loaded story, once playing.
    pub(crate) story: Option<Arc<Story>>,
    /// Walker over the loaded story.
    pub(crate) navigator: StoryNavigator,
    /// Advisory message for the loading screen.
    pub(crate) loading_message: String,
    /// Why the session failed, while `Failed`.
    pub(crate) failure: Option<SessionFailure>,
    /// Set while a status request (or the story download it led to) is out.
    pub(crate) poll_in_flight: bool,
    /// Events not yet published.
    pending_events: Vec<SessionEvent>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Creates a session waiting for a theme.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            phase: SessionPhase::SelectingTheme,
            epoch: 0,
            theme: None,
            job: None,
            story: None,
            navigator: StoryNavigator::new(),
            loading_message: DEFAULT_LOADING_MESSAGE.to_owned(),
            failure: None,
            poll_in_flight: false,
            pending_events: Vec::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The recorded failure, while `Failed`.
    #[must_use]
    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    /// The generation job of the current attempt.
    #[must_use]
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    /// The navigator over the loaded story.
    #[must_use]
    pub fn navigator(&self) -> &StoryNavigator {
        &self.navigator
    }

    /// Drains events produced since the last call.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn transition(&mut self, to: SessionPhase) {
        let from = self.phase;
        self.phase = to;
        self.epoch += 1;
        info!(session_id = %self.session_id, %from, %to, "session phase changed");
        self.pending_events.push(SessionEvent::PhaseChanged {
            session_id: self.session_id,
            from,
            to,
        });
    }

    fn set_loading_message(&mut self, message: &str) {
        if self.loading_message == message {
            return;
        }
        message.clone_into(&mut self.loading_message);
        self.pending_events.push(SessionEvent::LoadingMessageChanged {
            session_id: self.session_id,
            message: message.to_owned(),
        });
    }

    fn fail(&mut self, failure: SessionFailure) {
        warn!(
            session_id = %self.session_id,
            kind = ?failure.kind,
            message = %failure.message,
            "session failed"
        );
        self.poll_in_flight = false;
        self.pending_events.push(SessionEvent::Failed {
            session_id: self.session_id,
            kind: failure.kind,
            message: failure.message.clone(),
        });
        self.failure = Some(failure);
        self.transition(SessionPhase::Failed);
    }

    fn clear_attempt(&mut self) {
        self.theme = None;
        self.job = None;
        self.story = None;
        self.navigator.reset();
        self.failure = None;
        self.poll_in_flight = false;
        self.loading_message = DEFAULT_LOADING_MESSAGE.to_owned();
    }

    fn is_current(&self, epoch: u64, expected: SessionPhase) -> bool {
        let current = self.epoch == epoch && self.phase == expected;
        if !current {
            debug!(
                session_id = %self.session_id,
                response_epoch = epoch,
                current_epoch = self.epoch,
                phase = %self.phase,
                "discarding stale service response"
            );
        }
        current
    }

    /// Accepts a theme and enters `Submitting`. Returns the epoch the create
    /// request must carry back.
    ///
    /// Starting from `Playing` or `Failed` discards the previous attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyTheme` for a blank theme and
    /// `SessionError::InvalidTransition` while a generation is in progress.
    pub fn begin_submission(&mut self, theme: &str) -> Result<u64, SessionError> {
        let theme = theme.trim();
        if theme.is_empty() {
            return Err(SessionError::EmptyTheme);
        }
        match self.phase {
            SessionPhase::SelectingTheme | SessionPhase::Playing | SessionPhase::Failed => {}
            phase @ (SessionPhase::Submitting | SessionPhase::Polling) => {
                return Err(SessionError::InvalidTransition {
                    intent: "start",
                    phase,
                });
            }
        }

        if self.phase != SessionPhase::SelectingTheme {
            self.transition(SessionPhase::SelectingTheme);
        }

        self.session_id = Uuid::new_v4();
        self.clear_attempt();
        self.theme = Some(theme.to_owned());
        self.transition(SessionPhase::Submitting);
        Ok(self.epoch)
    }

    /// Records the job returned by the create request and enters `Polling`.
    /// Returns `false` if the response was stale.
    pub fn accept_job(&mut self, epoch: u64, ticket: JobTicket, clock: &dyn Clock) -> bool {
        if !self.is_current(epoch, SessionPhase::Submitting) {
            return false;
        }
        info!(session_id = %self.session_id, job_id = %ticket.job_id, "generation job accepted");
        self.job = Some(Job::submitted(ticket, clock));
        self.transition(SessionPhase::Polling);
        true
    }

    /// Records a failed create request. Returns `false` if it was stale.
    pub fn reject_submission(&mut self, epoch: u64, error: &ServiceError) -> bool {
        if !self.is_current(epoch, SessionPhase::Submitting) {
            return false;
        }
        self.fail(SessionFailure::new(FailureKind::CreateFailed, error.detail()));
        true
    }

    /// Claims the single poll slot. Returns the epoch and job id to poll, or
    /// `None` when not polling or a poll is already in flight.
    pub fn begin_poll(&mut self) -> Option<(u64, String)> {
        if self.phase != SessionPhase::Polling || self.poll_in_flight {
            return None;
        }
        let job_id = self.job.as_ref()?.id.clone();
        self.poll_in_flight = true;
        Some((self.epoch, job_id))
    }

    /// Releases the poll slot claimed at `epoch` when its request was dropped
    /// before the answer was applied. Returns `false` if there was nothing to
    /// release.
    pub fn release_poll(&mut self, epoch: u64) -> bool {
        if self.epoch != epoch || self.phase != SessionPhase::Polling || !self.poll_in_flight {
            return false;
        }
        debug!(session_id = %self.session_id, epoch, "releasing abandoned poll");
        self.poll_in_flight = false;
        true
    }

    /// Fails a submission whose create request was dropped before it
    /// resolved. Returns `false` if the submission already moved on.
    pub fn abandon_submission(&mut self, epoch: u64) -> bool {
        if self.epoch != epoch || self.phase != SessionPhase::Submitting {
            return false;
        }
        self.fail(SessionFailure::new(FailureKind::CreateFailed, None));
        true
    }

    /// Applies a status report.
    pub fn apply_status(
        &mut self,
        epoch: u64,
        report: &JobStatusReport,
        clock: &dyn Clock,
    ) -> PollDecision {
        if !self.is_current(epoch, SessionPhase::Polling) {
            return PollDecision::Discarded;
        }
        if let Some(job) = self.job.as_mut() {
            job.record(report, clock);
        }

        match report.parsed_status() {
            JobStatus::Completed => match report.story_id.as_deref() {
                Some(story_id) if !story_id.is_empty() => {
                    self.set_loading_message(FETCHING_STORY_MESSAGE);
                    PollDecision::FetchStory(story_id.to_owned())
                }
                _ => {
                    self.fail(SessionFailure::new(
                        FailureKind::InvalidCompletion,
                        Some("Story generation completed but no story was returned"),
                    ));
                    PollDecision::Failed
                }
            },
            JobStatus::Failed => {
                self.fail(SessionFailure::new(
                    FailureKind::GenerationFailed,
                    report.error.as_deref(),
                ));
                PollDecision::Failed
            }
            JobStatus::Processing => {
                self.poll_in_flight = false;
                self.set_loading_message(PROCESSING_MESSAGE);
                PollDecision::Continue
            }
            JobStatus::Queued | JobStatus::Unknown(_) => {
                self.poll_in_flight = false;
                PollDecision::Continue
            }
        }
    }

    /// Records a failed status request. Returns `false` if it was stale.
    pub fn apply_poll_error(&mut self, epoch: u64, error: &ServiceError) -> bool {
        if !self.is_current(epoch, SessionPhase::Polling) {
            return false;
        }
        self.fail(SessionFailure::new(FailureKind::PollFailed, error.detail()));
        true
    }

    /// Applies the result of downloading the finished story. On success the
    /// session enters `Playing` at the story's root. Returns `false` if the
    /// response was stale.
    pub fn apply_story(&mut self, epoch: u64, result: Result<Story, ServiceError>) -> bool {
        if !self.is_current(epoch, SessionPhase::Polling) {
            return false;
        }
        self.poll_in_flight = false;

        let story = match result {
            Ok(story) => story,
            Err(error) => {
                self.fail(SessionFailure::new(
                    FailureKind::InvalidCompletion,
                    error.detail(),
                ));
                return true;
            }
        };
        if let Err(error) = story.validate() {
            warn!(session_id = %self.session_id, %error, "received malformed story");
            self.fail(SessionFailure::new(FailureKind::InvalidCompletion, None));
            return true;
        }

        let story = Arc::new(story);
        info!(
            session_id = %self.session_id,
            title = %story.title,
            nodes = story.node_count(),
            reachable = story.reachable_node_ids().len(),
            "story loaded"
        );
        self.navigator.initialize(Arc::clone(&story));
        self.story = Some(story);
        self.transition(SessionPhase::Playing);
        true
    }

    /// Leaves `Failed` for theme selection, keeping nothing but the session id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Failed`.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Failed {
            return Err(SessionError::InvalidTransition {
                intent: "retry",
                phase: self.phase,
            });
        }
        self.failure = None;
        self.transition(SessionPhase::SelectingTheme);
        Ok(())
    }

    /// Discards the job, the story and any error, and returns to theme
    /// selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Playing` and `Failed`.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        if !matches!(self.phase, SessionPhase::Playing | SessionPhase::Failed) {
            return Err(SessionError::InvalidTransition {
                intent: "restart",
                phase: self.phase,
            });
        }
        self.clear_attempt();
        self.transition(SessionPhase::SelectingTheme);
        Ok(())
    }

    fn playing_navigator(
        &mut self,
        intent: &'static str,
    ) -> Result<&mut StoryNavigator, SessionError> {
        if self.phase != SessionPhase::Playing {
            return Err(SessionError::InvalidTransition {
                intent,
                phase: self.phase,
            });
        }
        Ok(&mut self.navigator)
    }

    fn navigation_failed(&mut self, error: SessionError) -> SessionError {
        if let SessionError::NodeNotFound(message) = &error {
            self.fail(SessionFailure {
                kind: FailureKind::NodeNotFound,
                message: message.clone(),
            });
        }
        error
    }

    fn record_navigation(&mut self) {
        if let Some(node_id) = self.navigator.current_node_id() {
            let node_id = node_id.to_owned();
            self.pending_events.push(SessionEvent::Navigated {
                session_id: self.session_id,
                node_id,
            });
        }
    }

    /// Moves to `target_node_id` if it is an option of the current node.
    /// Returns whether the move was applied.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Playing`. Returns
    /// `SessionError::NodeNotFound` for a malformed story; the session is
    /// failed in that case.
    pub fn select_option(&mut self, target_node_id: &str) -> Result<bool, SessionError> {
        let result = self
            .playing_navigator("select an option")?
            .select_option(target_node_id)
            .map_err(SessionError::from);
        match result {
            Ok(true) => {
                self.record_navigation();
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(error) => Err(self.navigation_failed(error)),
        }
    }

    /// Steps back along the path. Returns whether the move was applied.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Playing`.
    pub fn go_back(&mut self) -> Result<bool, SessionError> {
        let moved = self.playing_navigator("go back")?.go_back();
        if moved {
            self.record_navigation();
        }
        Ok(moved)
    }

    /// Takes the navigator's transition lock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Playing`.
    pub fn begin_transition(&mut self) -> Result<bool, SessionError> {
        Ok(self.playing_navigator("begin a transition")?.begin_transition())
    }

    /// Releases the navigator's transition lock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Playing`.
    pub fn end_transition(&mut self) -> Result<(), SessionError> {
        self.playing_navigator("end a transition")?.end_transition();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taleforge_test_support::{FixedClock, completed, failed, sample_story, status};

    fn ticket() -> JobTicket {
        JobTicket {
            job_id: "job-1".into(),
        }
    }

    fn polling_state() -> SessionState {
        let mut state = SessionState::new();
        let epoch = state.begin_submission("fantasy").unwrap();
        assert!(state.accept_job(epoch, ticket(), &FixedClock::default()));
        state
    }

    fn playing_state() -> SessionState {
        let mut state = polling_state();
        let (epoch, _) = state.begin_poll().unwrap();
        state.apply_status(epoch, &completed("7"), &FixedClock::default());
        assert!(state.apply_story(epoch, Ok(sample_story())));
        state
    }

    #[test]
    fn test_begin_submission_rejects_blank_theme() {
        let mut state = SessionState::new();

        assert_eq!(state.begin_submission("   "), Err(SessionError::EmptyTheme));
        assert_eq!(state.phase(), SessionPhase::SelectingTheme);
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_submission_then_acceptance_enters_polling() {
        // Arrange
        let mut state = SessionState::new();

        // Act
        let epoch = state.begin_submission("  fantasy ").unwrap();
        let accepted = state.accept_job(epoch, ticket(), &FixedClock::default());

        // Assert
        assert!(accepted);
        assert_eq!(state.phase(), SessionPhase::Polling);
        assert_eq!(state.theme.as_deref(), Some("fantasy"));
        assert_eq!(state.job().unwrap().id, "job-1");
        assert_eq!(state.job().unwrap().status, JobStatus::Queued);

        let events = state.take_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1],
            SessionEvent::PhaseChanged {
                from: SessionPhase::Submitting,
                to: SessionPhase::Polling,
                ..
            }
        ));
    }

    #[test]
    fn test_start_is_rejected_while_generating() {
        let mut state = polling_state();

        let result = state.begin_submission("scifi");

        assert_eq!(
            result,
            Err(SessionError::InvalidTransition {
                intent: "start",
                phase: SessionPhase::Polling,
            })
        );
    }

    #[test]
    fn test_rejected_submission_uses_service_detail() {
        // Arrange
        let mut state = SessionState::new();
        let epoch = state.begin_submission("fantasy").unwrap();
        let error = ServiceError::Rejected {
            status: 422,
            detail: Some("Theme is too long".into()),
        };

        // Act
        assert!(state.reject_submission(epoch, &error));

        // Assert
        assert_eq!(state.phase(), SessionPhase::Failed);
        let failure = state.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::CreateFailed);
        assert_eq!(failure.message, "Theme is too long");
    }

    #[test]
    fn test_only_one_poll_may_be_in_flight() {
        let mut state = polling_state();

        let first = state.begin_poll();
        let second = state.begin_poll();

        assert_eq!(first.map(|(_, job_id)| job_id), Some("job-1".to_owned()));
        assert_eq!(second, None);
    }

    #[test]
    fn test_processing_updates_message_and_frees_poll_slot() {
        // Arrange
        let mut state = polling_state();
        let (epoch, _) = state.begin_poll().unwrap();

        // Act
        let decision = state.apply_status(epoch, &status("Processing"), &FixedClock::default());

        // Assert
        assert_eq!(decision, PollDecision::Continue);
        assert_eq!(state.phase(), SessionPhase::Polling);
        assert_eq!(state.loading_message, PROCESSING_MESSAGE);
        assert!(state.begin_poll().is_some());
    }

    #[test]
    fn test_queued_and_unknown_statuses_change_nothing() {
        let mut state = polling_state();
        state.take_events();

        for raw in ["queued", "QUEUED", "warming_up"] {
            let (epoch, _) = state.begin_poll().unwrap();
            let decision = state.apply_status(epoch, &status(raw), &FixedClock::default());
            assert_eq!(decision, PollDecision::Continue);
        }

        assert_eq!(state.phase(), SessionPhase::Polling);
        assert_eq!(state.loading_message, DEFAULT_LOADING_MESSAGE);
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_failed_status_is_matched_case_insensitively() {
        // Arrange
        let mut state = polling_state();
        let (epoch, _) = state.begin_poll().unwrap();
        let mut report = failed(None);
        report.status = "FAILED".into();

        // Act
        let decision = state.apply_status(epoch, &report, &FixedClock::default());

        // Assert
        assert_eq!(decision, PollDecision::Failed);
        assert_eq!(state.failure().unwrap().kind, FailureKind::GenerationFailed);
        assert_eq!(state.failure().unwrap().message, "Failed to generate story");
    }

    #[test]
    fn test_completed_without_story_id_is_invalid_completion() {
        // Arrange
        let mut state = polling_state();
        let (epoch, _) = state.begin_poll().unwrap();

        // Act
        let decision = state.apply_status(epoch, &status("completed"), &FixedClock::default());

        // Assert
        assert_eq!(decision, PollDecision::Failed);
        assert_eq!(state.phase(), SessionPhase::Failed);
        assert_eq!(state.failure().unwrap().kind, FailureKind::InvalidCompletion);
    }

    #[test]
    fn test_completed_keeps_poll_slot_until_story_applied() {
        // Arrange
        let mut state = polling_state();
        let (epoch, _) = state.begin_poll().unwrap();

        // Act
        let decision = state.apply_status(epoch, &completed("7"), &FixedClock::default());

        // Assert
        assert_eq!(decision, PollDecision::FetchStory("7".into()));
        assert_eq!(state.loading_message, FETCHING_STORY_MESSAGE);
        assert!(state.begin_poll().is_none());
        assert_eq!(state.job().unwrap().result_story_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_story_applied_enters_playing_at_root() {
        let state = playing_state();

        assert_eq!(state.phase(), SessionPhase::Playing);
        assert_eq!(state.navigator().current_node_id(), Some("root"));
        assert_eq!(state.navigator().discovered_count(), 1);
    }

    #[test]
    fn test_malformed_story_is_invalid_completion() {
        // Arrange
        let mut state = polling_state();
        let (epoch, _) = state.begin_poll().unwrap();
        state.apply_status(epoch, &completed("7"), &FixedClock::default());
        let mut story = sample_story();
        story.root_node_id = "missing".into();

        // Act
        assert!(state.apply_story(epoch, Ok(story)));

        // Assert
        assert_eq!(state.phase(), SessionPhase::Failed);
        assert_eq!(state.failure().unwrap().kind, FailureKind::InvalidCompletion);
        assert!(!state.navigator().is_initialized());
    }

    #[test]
    fn test_stale_responses_are_discarded_after_restart() {
        // Arrange: fail the session, restart, and start a new attempt.
        let mut state = polling_state();
        let (old_epoch, _) = state.begin_poll().unwrap();
        let error = ServiceError::Transport("reset by peer".into());
        assert!(state.apply_poll_error(old_epoch, &error));
        state.restart().unwrap();
        let new_epoch = state.begin_submission("horror").unwrap();

        // Act
        let decision = state.apply_status(old_epoch, &completed("9"), &FixedClock::default());
        let accepted = state.accept_job(old_epoch, ticket(), &FixedClock::default());

        // Assert
        assert_eq!(decision, PollDecision::Discarded);
        assert!(!accepted);
        assert_eq!(state.phase(), SessionPhase::Submitting);
        assert_eq!(state.epoch(), new_epoch);
    }

    #[test]
    fn test_retry_only_from_failed() {
        // Arrange
        let mut state = SessionState::new();
        assert!(matches!(
            state.retry(),
            Err(SessionError::InvalidTransition { intent: "retry", .. })
        ));
        let epoch = state.begin_submission("fantasy").unwrap();
        state.reject_submission(epoch, &ServiceError::Transport("down".into()));

        // Act
        state.retry().unwrap();

        // Assert
        assert_eq!(state.phase(), SessionPhase::SelectingTheme);
        assert!(state.failure().is_none());
    }

    #[test]
    fn test_restart_clears_job_story_and_navigator() {
        // Arrange
        let mut state = playing_state();
        state.select_option("a").unwrap();

        // Act
        state.restart().unwrap();

        // Assert
        assert_eq!(state.phase(), SessionPhase::SelectingTheme);
        assert!(state.job().is_none());
        assert!(state.story.is_none());
        assert!(!state.navigator().is_initialized());
        assert_eq!(state.loading_message, DEFAULT_LOADING_MESSAGE);
    }

    #[test]
    fn test_restart_rejected_while_polling() {
        let mut state = polling_state();

        assert!(matches!(
            state.restart(),
            Err(SessionError::InvalidTransition {
                intent: "restart",
                phase: SessionPhase::Polling,
            })
        ));
    }

    #[test]
    fn test_start_from_playing_discards_previous_story() {
        // Arrange
        let mut state = playing_state();
        let previous_session = state.session_id;

        // Act
        state.begin_submission("mystery").unwrap();

        // Assert
        assert_eq!(state.phase(), SessionPhase::Submitting);
        assert!(state.story.is_none());
        assert!(!state.navigator().is_initialized());
        assert_ne!(state.session_id, previous_session);
    }

    #[test]
    fn test_released_poll_can_be_claimed_again() {
        // Arrange
        let mut state = polling_state();
        let (epoch, _) = state.begin_poll().unwrap();

        // Act
        let released = state.release_poll(epoch);

        // Assert
        assert!(released);
        assert_eq!(state.phase(), SessionPhase::Polling);
        assert!(state.begin_poll().is_some());
    }

    #[test]
    fn test_release_poll_ignores_stale_epoch_and_idle_slot() {
        let mut state = polling_state();
        let (epoch, _) = state.begin_poll().unwrap();

        assert!(!state.release_poll(epoch + 1));
        assert!(state.release_poll(epoch));
        assert!(!state.release_poll(epoch));
    }

    #[test]
    fn test_abandoned_submission_fails_with_create_failed() {
        // Arrange
        let mut state = SessionState::new();
        let epoch = state.begin_submission("fantasy").unwrap();

        // Act
        let abandoned = state.abandon_submission(epoch);

        // Assert
        assert!(abandoned);
        assert_eq!(state.phase(), SessionPhase::Failed);
        assert_eq!(state.failure().unwrap().kind, FailureKind::CreateFailed);
        assert!(!state.abandon_submission(epoch));
        assert!(state.retry().is_ok());
    }

    #[test]
    fn test_job_error_is_shown_exactly_as_sent() {
        let mut state = polling_state();
        let (epoch, _) = state.begin_poll().unwrap();

        state.apply_status(epoch, &failed(Some(" oops ")), &FixedClock::default());

        assert_eq!(state.failure().unwrap().message, " oops ");
    }

    #[test]
    fn test_navigation_intents_require_playing() {
        let mut state = polling_state();

        assert!(matches!(
            state.select_option("a"),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            state.go_back(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_missing_node_fails_the_session() {
        // Arrange
        let mut state = playing_state();
        let mut story = sample_story();
        story.nodes_by_id.remove("a");
        state.navigator.initialize(Arc::new(story));

        // Act
        let result = state.select_option("a");

        // Assert
        let error = result.unwrap_err();
        assert_eq!(
            error.to_string(),
            "The story refers to a passage that does not exist: a"
        );
        assert_eq!(state.phase(), SessionPhase::Failed);
        assert_eq!(state.failure().unwrap().kind, FailureKind::NodeNotFound);
        assert_eq!(SessionError::from(state.failure().unwrap()), error);
    }
}
