use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::delivery::{Delivery, DeliveryOutcome, RenderedFile};
use crate::application::session::Session;
use crate::domain::render_jobs::{JobId, RenderJob, RenderJobState};
use crate::domain::selfie::Selfie;
use crate::domain::styles::{Style, StyleCatalog};

use super::clock::Clock;
use super::error::RenderError;
use super::types::{RenderApi, RenderRequest, RenderTiming};

pub const METRIC_SUBMISSIONS: &str = "tryon_render_submissions_total";
pub const METRIC_POLLS: &str = "tryon_render_polls_total";
pub const METRIC_OUTCOMES: &str = "tryon_render_outcomes_total";

/// Result of a successful "send to phone".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub job_id: JobId,
    pub style_id: &'static str,
    pub result_url: String,
    pub outcome: DeliveryOutcome,
}

/// Drives a single submission: create the job, poll it on a fixed interval,
/// then fetch and deliver the result.
///
/// One job is tracked at a time. Nothing is retried; the first error ends the
/// attempt and is recorded on the session.
pub struct RenderOrchestrator {
    api: Arc<dyn RenderApi>,
    clock: Arc<dyn Clock>,
    delivery: Delivery,
    timing: RenderTiming,
}

impl RenderOrchestrator {
    pub fn new(
        api: Arc<dyn RenderApi>,
        clock: Arc<dyn Clock>,
        delivery: Delivery,
        timing: RenderTiming,
    ) -> Self {
        Self {
            api,
            clock,
            delivery,
            timing,
        }
    }

    pub fn timing(&self) -> &RenderTiming {
        &self.timing
    }

    /// Run the whole flow for the session's selfie and selected style.
    ///
    /// On failure the session moves to `Failed` with a user-facing message and
    /// keeps the selfie; on success the selfie is gone and the session is idle.
    pub async fn send(
        &self,
        session: &mut Session,
        catalog: &StyleCatalog,
    ) -> Result<DeliveryReport, RenderError> {
        if session.phase().is_busy() {
            return Err(RenderError::InFlight);
        }

        match self.run(session, catalog).await {
            Ok(report) => {
                counter!(METRIC_OUTCOMES, "outcome" => "delivered").increment(1);
                Ok(report)
            }
            Err(err) => {
                counter!(METRIC_OUTCOMES, "outcome" => err.kind()).increment(1);
                warn!(
                    target = "tryon::render",
                    kind = err.kind(),
                    error = %err,
                    "render attempt failed"
                );
                session.fail(err.user_message());
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        session: &mut Session,
        catalog: &StyleCatalog,
    ) -> Result<DeliveryReport, RenderError> {
        if !session.is_unlocked() {
            return Err(RenderError::Locked);
        }
        let selfie = session.selfie().cloned().ok_or(RenderError::MissingSelfie)?;
        let style = session.selected_style(catalog);

        session.begin_submission();
        let job_id = self.submit(selfie, style.id).await?;

        session.mark_polling(job_id.clone());
        let result_url = self.await_completion(&job_id).await?;

        session.mark_delivering();
        let outcome = self.fetch_and_deliver(session, &result_url, style).await?;

        Ok(DeliveryReport {
            job_id,
            style_id: style.id,
            result_url,
            outcome,
        })
    }

    /// Create a render job for `selfie` in the given style.
    pub async fn submit(&self, selfie: Selfie, style_id: &str) -> Result<JobId, RenderError> {
        counter!(METRIC_SUBMISSIONS).increment(1);
        info!(
            target = "tryon::render",
            style_id,
            bytes = selfie.len(),
            "submitting render job"
        );

        let request = RenderRequest {
            selfie,
            style_id: style_id.to_string(),
        };
        let job_id = self.api.create_job(request).await?;

        info!(target = "tryon::render", job_id = %job_id, "render job created");
        Ok(job_id)
    }

    pub async fn poll(&self, job_id: &JobId) -> Result<RenderJob, RenderError> {
        counter!(METRIC_POLLS).increment(1);
        let job = self.api.job_status(job_id).await?;
        debug!(
            target = "tryon::render",
            job_id = %job_id,
            state = job.state.as_str(),
            "polled render job"
        );
        Ok(job)
    }

    /// Poll every `poll_interval` until the job is done, fails, or `timeout`
    /// has elapsed. Each iteration sleeps before polling.
    pub async fn await_completion(&self, job_id: &JobId) -> Result<String, RenderError> {
        let started = self.clock.elapsed();
        let mut polls: u32 = 0;

        while self.clock.elapsed().saturating_sub(started) < self.timing.timeout {
            self.clock.sleep(self.timing.poll_interval).await;
            let job = self.poll(job_id).await?;
            polls += 1;

            match job.state {
                RenderJobState::Done { result_url } => {
                    info!(
                        target = "tryon::render",
                        job_id = %job_id,
                        polls,
                        "render job finished"
                    );
                    return Ok(result_url);
                }
                RenderJobState::Failed { error } => return Err(RenderError::render_failed(error)),
                RenderJobState::Pending => {}
            }
        }

        Err(RenderError::Timeout {
            waited: self.clock.elapsed().saturating_sub(started),
            polls,
        })
    }

    /// Download the result, wrap it as a named file and hand it to the delivery
    /// strategy. The session's selfie is discarded once delivery succeeds.
    pub async fn fetch_and_deliver(
        &self,
        session: &mut Session,
        result_url: &str,
        style: &Style,
    ) -> Result<DeliveryOutcome, RenderError> {
        let bytes = self.api.fetch_result(result_url).await?;
        let file = RenderedFile::for_style(style, bytes);
        let outcome = self.delivery.deliver(&file).await?;
        session.finish_delivery();
        Ok(outcome)
    }
}
