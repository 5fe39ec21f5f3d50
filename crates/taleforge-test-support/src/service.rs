//! Test services — fake `StoryGenerationService` implementations for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use taleforge_core::error::ServiceError;
use taleforge_core::job::{JobStatusReport, JobTicket};
use taleforge_core::service::StoryGenerationService;
use taleforge_core::story::Story;
use tokio::sync::Semaphore;

/// A call received by a fake service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    /// `create_story(theme)`.
    CreateStory(String),
    /// `job_status(job_id)`.
    JobStatus(String),
    /// `complete_story(story_id)`.
    CompleteStory(String),
}

/// Builds a status report with no story id or error.
#[must_use]
pub fn status(raw: &str) -> JobStatusReport {
    JobStatusReport {
        status: raw.to_owned(),
        story_id: None,
        error: None,
    }
}

/// Builds a `completed` status report pointing at `story_id`.
#[must_use]
pub fn completed(story_id: &str) -> JobStatusReport {
    JobStatusReport {
        status: "completed".to_owned(),
        story_id: Some(story_id.to_owned()),
        error: None,
    }
}

/// Builds a `failed` status report with an optional error detail.
#[must_use]
pub fn failed(error: Option<&str>) -> JobStatusReport {
    JobStatusReport {
        status: "failed".to_owned(),
        story_id: None,
        error: error.map(str::to_owned),
    }
}

/// A service that replays scripted responses and records every call.
///
/// Status responses are consumed in order; once the script is exhausted every
/// further status request answers `queued`. Stories are served from a map
/// keyed by story id; unknown ids answer a 404 rejection.
#[derive(Debug)]
pub struct ScriptedStoryService {
    create_result: Mutex<Result<JobTicket, ServiceError>>,
    statuses: Mutex<VecDeque<Result<JobStatusReport, ServiceError>>>,
    stories: Mutex<HashMap<String, Story>>,
    calls: Mutex<Vec<ServiceCall>>,
}

impl ScriptedStoryService {
    /// Creates a service whose `create_story` hands out `job_id`.
    #[must_use]
    pub fn new(job_id: &str) -> Self {
        Self {
            create_result: Mutex::new(Ok(JobTicket {
                job_id: job_id.to_owned(),
            })),
            statuses: Mutex::new(VecDeque::new()),
            stories: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes `create_story` fail with `error`.
    #[must_use]
    pub fn with_create_error(self, error: ServiceError) -> Self {
        *self.create_result.lock().unwrap() = Err(error);
        self
    }

    /// Appends a status response to the script.
    #[must_use]
    pub fn with_status(self, report: JobStatusReport) -> Self {
        self.statuses.lock().unwrap().push_back(Ok(report));
        self
    }

    /// Appends a failing status response to the script.
    #[must_use]
    pub fn with_status_error(self, error: ServiceError) -> Self {
        self.statuses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Serves `story` for `complete_story(story_id)`.
    #[must_use]
    pub fn with_story(self, story_id: &str, story: Story) -> Self {
        self.stories
            .lock()
            .unwrap()
            .insert(story_id.to_owned(), story);
        self
    }

    /// Returns a snapshot of all calls received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of `job_status` calls received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn status_call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, ServiceCall::JobStatus(_)))
            .count()
    }

    fn record(&self, call: ServiceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl StoryGenerationService for ScriptedStoryService {
    async fn create_story(&self, theme: &str) -> Result<JobTicket, ServiceError> {
        self.record(ServiceCall::CreateStory(theme.to_owned()));
        self.create_result.lock().unwrap().clone()
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusReport, ServiceError> {
        self.record(ServiceCall::JobStatus(job_id.to_owned()));
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(status("queued")))
    }

    async fn complete_story(&self, story_id: &str) -> Result<Story, ServiceError> {
        self.record(ServiceCall::CompleteStory(story_id.to_owned()));
        self.stories
            .lock()
            .unwrap()
            .get(story_id)
            .cloned()
            .ok_or_else(|| ServiceError::Rejected {
                status: 404,
                detail: Some("Story not found".to_owned()),
            })
    }
}

/// A service that holds every `job_status` call until the test releases it.
///
/// Calls are recorded as soon as they arrive, before they block, so a test
/// can observe how many status requests are in flight.
#[derive(Debug)]
pub struct GatedStoryService {
    inner: ScriptedStoryService,
    gate: Semaphore,
    create_gate: Option<Semaphore>,
}

impl GatedStoryService {
    /// Wraps a scripted service; status calls block until released.
    #[must_use]
    pub fn new(inner: ScriptedStoryService) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
            create_gate: None,
        }
    }

    /// Also holds `create_story` calls until `release_create` is called.
    #[must_use]
    pub fn with_gated_create(mut self) -> Self {
        self.create_gate = Some(Semaphore::new(0));
        self
    }

    /// Lets one pending or future `job_status` call proceed.
    pub fn release_one(&self) {
        self.gate.add_permits(1);
    }

    /// Lets one pending or future `create_story` call proceed.
    pub fn release_create(&self) {
        if let Some(gate) = &self.create_gate {
            gate.add_permits(1);
        }
    }

    /// Returns a snapshot of all calls received so far.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.inner.calls()
    }

    /// Number of `job_status` calls received so far, released or not.
    pub fn status_call_count(&self) -> usize {
        self.inner.status_call_count()
    }
}

#[async_trait]
impl StoryGenerationService for GatedStoryService {
    async fn create_story(&self, theme: &str) -> Result<JobTicket, ServiceError> {
        if let Some(gate) = &self.create_gate {
            gate.acquire()
                .await
                .map_err(|e| ServiceError::Transport(format!("gate closed: {e}")))?
                .forget();
        }
        self.inner.create_story(theme).await
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusReport, ServiceError> {
        self.inner.record(ServiceCall::JobStatus(job_id.to_owned()));
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ServiceError::Transport(format!("gate closed: {e}")))?;
        permit.forget();
        self.inner
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(status("queued")))
    }

    async fn complete_story(&self, story_id: &str) -> Result<Story, ServiceError> {
        self.inner.complete_story(story_id).await
    }
}

/// A service whose every call fails with a transport error.
#[derive(Debug)]
pub struct FailingStoryService;

#[async_trait]
impl StoryGenerationService for FailingStoryService {
    async fn create_story(&self, _theme: &str) -> Result<JobTicket, ServiceError> {
        Err(ServiceError::Transport("connection refused".into()))
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobStatusReport, ServiceError> {
        Err(ServiceError::Transport("connection refused".into()))
    }

    async fn complete_story(&self, _story_id: &str) -> Result<Story, ServiceError> {
        Err(ServiceError::Transport("connection refused".into()))
    }
}
