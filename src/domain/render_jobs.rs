//! Render jobs as seen by the client.
//!
//! A job is created by the render service and only ever read here. The client
//! tracks one job per submission and keeps no history.

use std::fmt;

use serde::Serialize;
use tryon_api_types::{RenderJobStatusResponse, RenderStatus};

use super::error::DomainError;

/// Opaque job identifier handed out by the render service. Stored exactly as
/// received; only all-whitespace ids are refused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::validation("job id", "must not be empty"));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderJobState {
    Pending,
    Done { result_url: String },
    Failed { error: Option<String> },
}

impl RenderJobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderJobState::Pending => "pending",
            RenderJobState::Done { .. } => "done",
            RenderJobState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RenderJobState::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub job_id: JobId,
    pub state: RenderJobState,
}

impl RenderJob {
    /// Interpret a status body.
    ///
    /// `done` without a usable `resultUrl` and unrecognised statuses are read as
    /// still pending, so polling carries on until a usable answer or the timeout.
    pub fn from_status(job_id: JobId, status: RenderJobStatusResponse) -> Self {
        let state = match status.status {
            RenderStatus::Done => match status.result_url {
                Some(url) if !url.trim().is_empty() => RenderJobState::Done { result_url: url },
                _ => RenderJobState::Pending,
            },
            RenderStatus::Failed => RenderJobState::Failed {
                error: status.error,
            },
            RenderStatus::Pending | RenderStatus::Unknown => RenderJobState::Pending,
        };
        Self { job_id, state }
    }
}
