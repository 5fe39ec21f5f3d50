//! Story generation jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::ids;

/// Lifecycle status of a generation job, parsed case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Accepted but not yet picked up.
    Queued,
    /// The story is being generated.
    Processing,
    /// Generation finished; a story id should be attached.
    Completed,
    /// Generation failed; an error detail may be attached.
    Failed,
    /// A status string this client does not know. Treated as non-terminal.
    Unknown(String),
}

impl JobStatus {
    /// Parses a raw status string, ignoring ASCII case and surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        [
            ("queued", Self::Queued),
            ("processing", Self::Processing),
            ("completed", Self::Completed),
            ("failed", Self::Failed),
        ]
        .into_iter()
        .find(|(name, _)| trimmed.eq_ignore_ascii_case(name))
        .map_or_else(|| Self::Unknown(trimmed.to_owned()), |(_, status)| status)
    }

    /// Returns `true` for `Completed` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Response to a story creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTicket {
    /// Identifier used to poll the job.
    #[serde(deserialize_with = "ids::deserialize_id")]
    pub job_id: String,
}

/// Response to a job status request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusReport {
    /// Raw status string as sent by the service.
    pub status: String,
    /// Id of the finished story, present once the job completed.
    #[serde(default, deserialize_with = "ids::deserialize_optional_id")]
    pub story_id: Option<String>,
    /// Failure detail, present when the job failed.
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusReport {
    /// Parsed form of [`Self::status`].
    #[must_use]
    pub fn parsed_status(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }
}

/// Client-side record of a submitted generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    /// Service-assigned job id.
    pub id: String,
    /// Last observed status.
    pub status: JobStatus,
    /// Story id once the job completed.
    pub result_story_id: Option<String>,
    /// Error detail once the job failed.
    pub error_detail: Option<String>,
    /// When the service accepted the job.
    pub submitted_at: DateTime<Utc>,
    /// When the last status report was recorded.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Creates a queued job from a creation ticket.
    #[must_use]
    pub fn submitted(ticket: JobTicket, clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self {
            id: ticket.job_id,
            status: JobStatus::Queued,
            result_story_id: None,
            error_detail: None,
            submitted_at: now,
            updated_at: now,
        }
    }

    /// Records a status report against this job.
    pub fn record(&mut self, report: &JobStatusReport, clock: &dyn Clock) {
        self.status = report.parsed_status();
        if report.story_id.is_some() {
            self.result_story_id.clone_from(&report.story_id);
        }
        if report.error.is_some() {
            self.error_detail.clone_from(&report.error);
        }
        self.updated_at = clock.now();
    }
}
