use std::time::Duration;

use thiserror::Error;

use crate::application::delivery::DeliveryError;

pub const DEFAULT_RENDER_FAILED_MESSAGE: &str = "Render failed.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Render request failed ({status}).")]
    Status { status: u16 },
    #[error("No jobId returned.")]
    MissingJobId,
    #[error("Render request could not be sent: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("Status check failed ({status}).")]
    Status { status: u16 },
    #[error("Status check could not be completed: {0}")]
    Transport(String),
    #[error("Status check returned an unreadable body: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DownloadError {
    #[error("Could not download finished image.")]
    Status { status: u16 },
    #[error("Could not download finished image: {0}")]
    Transport(String),
}

/// Everything that can end a submission early. None of these are retried.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("This app is locked for staff use only.")]
    Locked,
    #[error("Add a selfie first.")]
    MissingSelfie,
    #[error("A render is already in progress.")]
    InFlight,
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error("{message}")]
    RenderFailed { message: String },
    #[error("Render timed out. Try again.")]
    Timeout { waited: Duration, polls: u32 },
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl RenderError {
    /// Server-reported failure; a missing or blank message gets the default text.
    pub fn render_failed(message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_RENDER_FAILED_MESSAGE.to_string());
        Self::RenderFailed { message }
    }

    /// Text to show the barber.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::Locked => "locked",
            RenderError::MissingSelfie => "missing_selfie",
            RenderError::InFlight => "in_flight",
            RenderError::Submission(_) => "submission",
            RenderError::Poll(_) => "poll",
            RenderError::RenderFailed { .. } => "render_failed",
            RenderError::Timeout { .. } => "timeout",
            RenderError::Download(_) => "download",
            RenderError::Delivery(_) => "delivery",
        }
    }
}
