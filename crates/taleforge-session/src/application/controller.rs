//! The session controller.
//!
//! Wraps a `SessionState` behind a mutex that is never held across an await,
//! talks to the `StoryGenerationService`, and owns the background poll task.
//! The poll task is aborted inside the same critical section that moves the
//! session out of `Polling`, and anything it was waiting on comes back with a
//! stale epoch and is dropped by the state machine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use taleforge_core::clock::{Clock, SystemClock};
use taleforge_core::job::Job;
use taleforge_core::service::StoryGenerationService;
use taleforge_core::story::Story;
use taleforge_core::theme::Theme;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use super::config::SessionConfig;
use super::query_handlers::{SessionView, session_view};
use crate::domain::error::SessionError;
use crate::domain::events::SessionEvent;
use crate::domain::phase::SessionPhase;
use crate::domain::state::{PollDecision, SessionState};

/// Result of one `poll_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The session is not polling; nothing was requested.
    Idle,
    /// Another poll is still in flight; nothing was requested.
    Skipped,
    /// The job is not terminal yet.
    Pending,
    /// The story loaded and the session is playing.
    Playing,
    /// The session failed.
    Failed,
    /// The session moved on while the request was out; the response was dropped.
    Discarded,
}

impl PollOutcome {
    /// Whether the poll loop should keep going after this outcome.
    #[must_use]
    pub fn keeps_polling(self) -> bool {
        matches!(self, Self::Pending | Self::Skipped)
    }
}

/// A request claimed under the state lock at `epoch`. If the future awaiting
/// the service is dropped before `complete` is called, `abandon` runs against
/// the state so the claim does not outlive the request.
struct PendingRequest<'a> {
    shared: &'a Arc<Shared>,
    epoch: u64,
    abandon: fn(&mut SessionState, u64) -> bool,
    armed: bool,
}

impl<'a> PendingRequest<'a> {
    fn new(
        shared: &'a Arc<Shared>,
        epoch: u64,
        abandon: fn(&mut SessionState, u64) -> bool,
    ) -> Self {
        Self {
            shared,
            epoch,
            abandon,
            armed: true,
        }
    }

    /// The response arrived; it is applied by the caller.
    fn complete(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let (abandon, epoch) = (self.abandon, self.epoch);
        if self.shared.update(|state| abandon(state, epoch)) {
            debug!(epoch, "service request abandoned before it resolved");
        }
    }
}

struct Shared {
    state: Mutex<SessionState>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    service: Arc<dyn StoryGenerationService>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    events: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `apply` against the state, keeps the poll task in line with the
    /// resulting phase, and publishes the events it produced.
    fn update<T>(self: &Arc<Self>, apply: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut state = self.lock_state();
        let output = apply(&mut state);
        self.reconcile_poll_task(state.phase());
        let events = state.take_events();
        drop(state);

        for event in events {
            // No subscribers is not an error.
            let _ = self.events.send(event);
        }
        output
    }

    /// Must be called with the state lock held.
    fn reconcile_poll_task(self: &Arc<Self>, phase: SessionPhase) {
        let mut poll_task = self.poll_task.lock().unwrap_or_else(PoisonError::into_inner);

        if phase != SessionPhase::Polling {
            if let Some(task) = poll_task.take() {
                debug!("stopping poll task");
                task.abort();
            }
            return;
        }

        if !self.config.auto_poll || poll_task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(interval = ?self.config.poll_interval, "starting poll task");
                let shared = Arc::downgrade(self);
                let interval = self.config.poll_interval;
                *poll_task = Some(runtime.spawn(run_poll_loop(shared, interval)));
            }
            Err(error) => {
                warn!(%error, "no tokio runtime; poll_tick must be driven manually");
            }
        }
    }

    async fn poll_tick(self: &Arc<Self>) -> PollOutcome {
        let (phase, claimed) = self.update(|state| (state.phase(), state.begin_poll()));
        let Some((epoch, job_id)) = claimed else {
            return if phase == SessionPhase::Polling {
                debug!("poll already in flight; skipping tick");
                PollOutcome::Skipped
            } else {
                PollOutcome::Idle
            };
        };

        let pending = PendingRequest::new(self, epoch, SessionState::release_poll);
        let clock = self.clock.as_ref();
        let decision = match self.service.job_status(&job_id).await {
            Ok(report) => {
                debug!(%job_id, status = %report.status, "job status received");
                self.update(|state| state.apply_status(epoch, &report, clock))
            }
            Err(error) => {
                warn!(%job_id, %error, "job status request failed");
                if self.update(|state| state.apply_poll_error(epoch, &error)) {
                    PollDecision::Failed
                } else {
                    PollDecision::Discarded
                }
            }
        };

        match decision {
            PollDecision::Continue => {
                pending.complete();
                PollOutcome::Pending
            }
            PollDecision::Failed => {
                pending.complete();
                PollOutcome::Failed
            }
            PollDecision::Discarded => {
                pending.complete();
                PollOutcome::Discarded
            }
            PollDecision::FetchStory(story_id) => {
                let result = self.service.complete_story(&story_id).await;
                pending.complete();
                if let Err(error) = &result {
                    warn!(%story_id, %error, "story download failed");
                }
                let (applied, phase) =
                    self.update(|state| (state.apply_story(epoch, result), state.phase()));
                match (applied, phase) {
                    (false, _) => PollOutcome::Discarded,
                    (true, SessionPhase::Playing) => PollOutcome::Playing,
                    (true, _) => PollOutcome::Failed,
                }
            }
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let poll_task = self
            .poll_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = poll_task.take() {
            task.abort();
        }
    }
}

/// Sleeps one interval, polls, and repeats until the session leaves `Polling`
/// or the controller is dropped. The next sleep only starts once the previous
/// poll has been fully applied.
async fn run_poll_loop(shared: Weak<Shared>, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if !shared.poll_tick().await.keeps_polling() {
            break;
        }
    }
}

/// Drives a story generation session on behalf of a presentation layer.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Creates a controller waiting for a theme.
    #[must_use]
    pub fn new(
        service: Arc<dyn StoryGenerationService>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::new()),
                poll_task: Mutex::new(None),
                service,
                clock,
                config,
                events,
            }),
        }
    }

    /// Creates a controller with the system clock and default configuration.
    #[must_use]
    pub fn with_service(service: Arc<dyn StoryGenerationService>) -> Self {
        Self::new(service, Arc::new(SystemClock), SessionConfig::default())
    }

    /// Subscribes to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.shared.lock_state().phase()
    }

    /// Read-only projection for rendering.
    #[must_use]
    pub fn view(&self) -> SessionView {
        session_view(&self.shared.lock_state())
    }

    /// The failure of the current attempt, while `Failed`.
    #[must_use]
    pub fn last_error(&self) -> Option<SessionError> {
        self.shared.lock_state().failure().map(SessionError::from)
    }

    /// Snapshot of the current generation job.
    #[must_use]
    pub fn job(&self) -> Option<Job> {
        self.shared.lock_state().job().cloned()
    }

    /// The loaded story, while playing.
    #[must_use]
    pub fn story(&self) -> Option<Arc<Story>> {
        self.shared.lock_state().story.clone()
    }

    /// Submits `theme` for generation.
    ///
    /// On return the session is `Polling` if the service accepted the theme,
    /// or `Failed` if it did not. With `auto_poll` the poll task is running.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyTheme` for a blank theme and
    /// `SessionError::InvalidTransition` while a generation is already in
    /// progress. Service failures are not errors here; they fail the session.
    #[instrument(skip(self))]
    pub async fn start(&self, theme: &str) -> Result<SessionPhase, SessionError> {
        let epoch = self.shared.update(|state| state.begin_submission(theme))?;

        let pending =
            PendingRequest::new(&self.shared, epoch, SessionState::abandon_submission);
        let result = self.shared.service.create_story(theme.trim()).await;
        pending.complete();
        let clock = self.shared.clock.as_ref();
        let phase = self.shared.update(|state| {
            match result {
                Ok(ticket) => {
                    state.accept_job(epoch, ticket, clock);
                }
                Err(error) => {
                    warn!(%error, "story creation failed");
                    state.reject_submission(epoch, &error);
                }
            }
            state.phase()
        });
        Ok(phase)
    }

    /// Submits a theme picked from the catalog or typed as free text.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownTheme` for an id outside the catalog,
    /// `SessionError::EmptyTheme` for blank free text, and otherwise the
    /// errors of [`SessionController::start`].
    pub async fn start_with_theme(&self, theme: &Theme) -> Result<SessionPhase, SessionError> {
        let theme = theme.resolve()?;
        self.start(&theme).await
    }

    /// Requests the job status once and applies the answer.
    ///
    /// Does nothing outside `Polling` or while another poll is in flight.
    #[instrument(skip(self))]
    pub async fn poll_tick(&self) -> PollOutcome {
        self.shared.poll_tick().await
    }

    /// Leaves `Failed` for theme selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Failed`.
    pub fn retry(&self) -> Result<(), SessionError> {
        self.shared.update(SessionState::retry)
    }

    /// Discards the current job and story and returns to theme selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Playing` and `Failed`.
    pub fn restart(&self) -> Result<(), SessionError> {
        self.shared.update(SessionState::restart)
    }

    /// Picks the option of the current node leading to `target_node_id`.
    /// Returns whether the player moved.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Playing`, and
    /// `SessionError::NodeNotFound` if the story is malformed, which also
    /// fails the session.
    pub fn select_option(&self, target_node_id: &str) -> Result<bool, SessionError> {
        self.shared.update(|state| state.select_option(target_node_id))
    }

    /// Steps back along the path. Returns whether the player moved.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Playing`.
    pub fn go_back(&self) -> Result<bool, SessionError> {
        self.shared.update(SessionState::go_back)
    }

    /// Takes the navigator's transition lock for the duration of an
    /// animation. Returns `false` if it is already held.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Playing`.
    pub fn begin_transition(&self) -> Result<bool, SessionError> {
        self.shared.update(SessionState::begin_transition)
    }

    /// Releases the navigator's transition lock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Playing`.
    pub fn end_transition(&self) -> Result<(), SessionError> {
        self.shared.update(SessionState::end_transition)
    }
}
