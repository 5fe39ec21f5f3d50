//! Story generation service abstraction.

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::job::{JobStatusReport, JobTicket};
use crate::story::Story;

/// The remote service that generates stories asynchronously.
///
/// Each call resolves exactly once; callers never issue a second status
/// request for a job before the first one resolved.
#[async_trait]
pub trait StoryGenerationService: Send + Sync {
    /// Submits a theme and returns the job that will generate the story.
    async fn create_story(&self, theme: &str) -> Result<JobTicket, ServiceError>;

    /// Fetches the current status of a job.
    async fn job_status(&self, job_id: &str) -> Result<JobStatusReport, ServiceError>;

    /// Fetches the full story graph of a completed job.
    async fn complete_story(&self, story_id: &str) -> Result<Story, ServiceError>;
}
