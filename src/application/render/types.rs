use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::render_jobs::{JobId, RenderJob};
use crate::domain::selfie::Selfie;

use super::error::{DownloadError, PollError, SubmissionError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(900);
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_millis(60_000);

/// One submission to the render service.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub selfie: Selfie,
    pub style_id: String,
}

/// The remote render service as the orchestrator sees it.
///
/// Implementations own the wire details (multipart encoding, status codes,
/// body decoding) and report failures in the stage-specific error types.
#[async_trait]
pub trait RenderApi: Send + Sync {
    /// Create a job. Non-success statuses and bodies without a job id are errors.
    async fn create_job(&self, request: RenderRequest) -> Result<JobId, SubmissionError>;

    /// Read the current state of a job.
    async fn job_status(&self, job_id: &JobId) -> Result<RenderJob, PollError>;

    /// Download the finished image.
    async fn fetch_result(&self, result_url: &str) -> Result<Bytes, DownloadError>;
}

/// Fixed polling parameters. The interval is constant; there is no backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTiming {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for RenderTiming {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }
}
