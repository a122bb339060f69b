//! Render job submission, polling and result delivery.
//!
//! The orchestrator is a cooperative, single-flow loop: one job per
//! submission, a constant poll interval, and a hard timeout. Time comes from an
//! injected [`Clock`] so the loop can be driven deterministically.

mod clock;
mod error;
mod orchestrator;
mod types;

pub use clock::{Clock, TokioClock, VirtualClock};
pub use error::{
    DEFAULT_RENDER_FAILED_MESSAGE, DownloadError, GENERIC_FAILURE_MESSAGE, PollError,
    RenderError, SubmissionError,
};
pub use orchestrator::{
    DeliveryReport, METRIC_OUTCOMES, METRIC_POLLS, METRIC_SUBMISSIONS, RenderOrchestrator,
};
pub use types::{
    DEFAULT_POLL_INTERVAL, DEFAULT_RENDER_TIMEOUT, RenderApi, RenderRequest, RenderTiming,
};
