//! HTTP client for the remote render service.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    Client, Response, Url,
    multipart::{Form, Part},
};
use tracing::{debug, warn};
use tryon_api_types::{
    CreateRenderJobResponse, DEFAULT_OUTPUT_FORMAT, FIELD_FORMAT, FIELD_IMAGE, FIELD_STYLE_ID, RENDER_JOBS_PATH,
    RenderJobStatusResponse,
};

use crate::application::render::{
    DownloadError, PollError, RenderApi, RenderRequest, SubmissionError,
};
use crate::config::RenderSettings;
use crate::domain::render_jobs::{JobId, RenderJob};

use super::error::InfraError;

const SOURCE: &str = "tryon::infra::render_client";

/// [`RenderApi`] over HTTP: multipart job creation, JSON status polling and a
/// plain GET for the finished image.
#[derive(Clone, Debug)]
pub struct HttpRenderApi {
    client: Client,
    base: Url,
}

impl HttpRenderApi {
    /// `base` must end in `/` for relative joins to keep its path.
    pub fn new(base: Url, request_timeout: Duration) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(request_timeout)
            .build()
            .map_err(InfraError::RenderClient)?;
        Ok(Self { client, base })
    }

    pub fn from_settings(settings: &RenderSettings) -> Result<Self, InfraError> {
        Self::new(settings.base_url.clone(), settings.request_timeout)
    }

    pub fn user_agent() -> &'static str {
        concat!("tryon/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn jobs_url(&self) -> Result<Url, url::ParseError> {
        self.base.join(RENDER_JOBS_PATH)
    }

    /// Job status URL; the id is percent-encoded as a single path segment.
    pub fn job_url(&self, job_id: &JobId) -> Result<Url, url::ParseError> {
        let mut url = self.jobs_url()?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(job_id.as_str());
        }
        Ok(url)
    }

    /// Absolute result URLs are used as-is; relative ones resolve against the base.
    pub fn result_url(&self, raw: &str) -> Result<Url, url::ParseError> {
        self.base.join(raw.trim())
    }
}

#[async_trait]
impl RenderApi for HttpRenderApi {
    async fn create_job(&self, request: RenderRequest) -> Result<JobId, SubmissionError> {
        let RenderRequest { selfie, style_id } = request;

        let url = self
            .jobs_url()
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;

        let part = Part::bytes(selfie.bytes().to_vec())
            .file_name(selfie.file_name().to_string())
            .mime_str(selfie.content_type())
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;
        let form = Form::new()
            .part(FIELD_IMAGE, part)
            .text(FIELD_STYLE_ID, style_id)
            .text(FIELD_FORMAT, DEFAULT_OUTPUT_FORMAT);

        let resp = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            log_rejection("create_job", resp).await;
            return Err(SubmissionError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;
        let body: CreateRenderJobResponse = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(err) => {
                debug!(target = SOURCE, error = %err, "job creation body is not the expected JSON");
                CreateRenderJobResponse::default()
            }
        };

        body.job_id
            .and_then(|raw| JobId::parse(raw).ok())
            .ok_or(SubmissionError::MissingJobId)
    }

    async fn job_status(&self, job_id: &JobId) -> Result<RenderJob, PollError> {
        let url = self
            .job_url(job_id)
            .map_err(|err| PollError::Transport(err.to_string()))?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| PollError::Transport(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            log_rejection("job_status", resp).await;
            return Err(PollError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|err| PollError::Transport(err.to_string()))?;
        let body: RenderJobStatusResponse =
            serde_json::from_slice(&bytes).map_err(|err| PollError::Decode(err.to_string()))?;

        Ok(RenderJob::from_status(job_id.clone(), body))
    }

    async fn fetch_result(&self, result_url: &str) -> Result<Bytes, DownloadError> {
        let url = self
            .result_url(result_url)
            .map_err(|err| DownloadError::Transport(err.to_string()))?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| DownloadError::Transport(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            log_rejection("fetch_result", resp).await;
            return Err(DownloadError::Status {
                status: status.as_u16(),
            });
        }

        resp.bytes()
            .await
            .map_err(|err| DownloadError::Transport(err.to_string()))
    }
}

async fn log_rejection(operation: &'static str, resp: Response) {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp.text().await.unwrap_or_default();
    warn!(
        target = SOURCE,
        operation,
        status = status.as_u16(),
        url = %url,
        body = %truncate(&body, 256),
        "render service returned a non-success status"
    );
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpRenderApi {
        HttpRenderApi::new(Url::parse(base).expect("base url"), Duration::from_secs(5))
            .expect("client builds")
    }

    #[test]
    fn job_url_keeps_padded_ids_distinct() {
        let api = api("https://render.example/");
        let job = JobId::parse(" 42").expect("job id");
        assert_eq!(
            api.job_url(&job).expect("url").as_str(),
            "https://render.example/api/render/%2042"
        );
    }

    #[test]
    fn job_url_encodes_the_id_as_one_segment() {
        let api = api("https://render.example/");
        let job = JobId::parse("a b/c").expect("job id");
        assert_eq!(
            api.job_url(&job).expect("url").as_str(),
            "https://render.example/api/render/a%20b%2Fc"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let api = api("https://shop.example/tryon/");
        let job = JobId::parse("42").expect("job id");
        assert_eq!(
            api.job_url(&job).expect("url").as_str(),
            "https://shop.example/tryon/api/render/42"
        );
    }

    #[test]
    fn relative_result_url_resolves_against_base() {
        let api = api("https://render.example/");
        assert_eq!(
            api.result_url("/renders/42.jpg").expect("url").as_str(),
            "https://render.example/renders/42.jpg"
        );
        assert_eq!(
            api.result_url("https://cdn.example/42.jpg")
                .expect("url")
                .as_str(),
            "https://cdn.example/42.jpg"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(HttpRenderApi::user_agent().starts_with("tryon/"));
    }
}
