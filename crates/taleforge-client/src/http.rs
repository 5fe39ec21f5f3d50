//! `StoryGenerationService` over the service's JSON API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use taleforge_core::error::ServiceError;
use taleforge_core::job::{JobStatusReport, JobTicket};
use taleforge_core::service::StoryGenerationService;
use taleforge_core::story::Story;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::dto::{CompleteStoryResponse, CreateStoryRequest, ErrorBody};

/// HTTP client for the story generation service.
///
/// The underlying client keeps a cookie store, so a session cookie set by
/// `create_story` is sent with every later request.
#[derive(Debug, Clone)]
pub struct HttpStoryService {
    http: Client,
    base_url: String,
}

impl HttpStoryService {
    /// Builds a service client from `config`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self::with_http_client(&config.base_url, http))
    }

    /// Wraps an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(base_url: &str, http: Client) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message());
        warn!(status = status.as_u16(), ?detail, "service rejected request");
        return Err(ServiceError::Rejected {
            status: status.as_u16(),
            detail,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::Decode(e.to_string()))
}

fn transport(error: &reqwest::Error) -> ServiceError {
    if error.is_decode() {
        ServiceError::Decode(error.to_string())
    } else {
        ServiceError::Transport(error.to_string())
    }
}

#[async_trait]
impl StoryGenerationService for HttpStoryService {
    #[instrument(skip(self))]
    async fn create_story(&self, theme: &str) -> Result<JobTicket, ServiceError> {
        let response = self
            .http
            .post(self.url("/stories/create"))
            .json(&CreateStoryRequest { theme })
            .send()
            .await
            .map_err(|e| transport(&e))?;
        let ticket: JobTicket = decode(response).await?;
        debug!(job_id = %ticket.job_id, "story job accepted");
        Ok(ticket)
    }

    #[instrument(skip(self))]
    async fn job_status(&self, job_id: &str) -> Result<JobStatusReport, ServiceError> {
        let response = self
            .http
            .get(self.url(&format!("/jobs/{job_id}")))
            .send()
            .await
            .map_err(|e| transport(&e))?;
        let report: JobStatusReport = decode(response).await?;
        debug!(status = %report.status, "job status received");
        Ok(report)
    }

    #[instrument(skip(self))]
    async fn complete_story(&self, story_id: &str) -> Result<Story, ServiceError> {
        let response = self
            .http
            .get(self.url(&format!("/stories/{story_id}/complete")))
            .send()
            .await
            .map_err(|e| transport(&e))?;
        let body: CompleteStoryResponse = decode(response).await?;
        let story = body
            .into_story()
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        debug!(nodes = story.node_count(), "story downloaded");
        Ok(story)
    }
}
