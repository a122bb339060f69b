//! Placeholder render endpoints.
//!
//! Submissions are read and validated like a real backend would, then turned
//! away with `501` until a renderer is wired in.

use axum::{
    extract::{
        Multipart, Path,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::Response,
};
use bytes::Bytes;
use tracing::{error, info};
use tryon_api_types::{FIELD_FORMAT, FIELD_IMAGE, FIELD_STYLE_ID};

use super::error::StubError;

const SOURCE: &str = "tryon::infra::http::render_stub";

pub const NOT_WIRED_MESSAGE: &str = "Render backend not wired yet.";

/// A validated render submission.
#[derive(Debug, Clone)]
pub struct RenderSubmission {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub image: Bytes,
    pub style_id: String,
    pub format: String,
}

pub(super) async fn create_render_job(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, StubError> {
    let mut multipart = multipart.map_err(|rejection| {
        StubError::bad_request(SOURCE, "Expected a multipart form.")
            .with_detail(rejection.body_text())
    })?;

    let submission = read_submission(&mut multipart).await?;
    info!(
        target = SOURCE,
        style_id = %submission.style_id,
        format = %submission.format,
        bytes = submission.image.len(),
        content_type = submission.content_type.as_deref().unwrap_or(""),
        "render submission received"
    );

    Err(StubError::new(
        SOURCE,
        StatusCode::NOT_IMPLEMENTED,
        NOT_WIRED_MESSAGE,
    ))
}

pub(super) async fn render_job_status(Path(job_id): Path<String>) -> Result<Response, StubError> {
    Err(
        StubError::new(SOURCE, StatusCode::NOT_IMPLEMENTED, NOT_WIRED_MESSAGE)
            .with_detail(format!("status requested for job {job_id}")),
    )
}

async fn read_submission(multipart: &mut Multipart) -> Result<RenderSubmission, StubError> {
    let mut image: Option<(Option<String>, Option<String>, Bytes)> = None;
    let mut style_id: Option<String> = None;
    let mut format: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some(FIELD_IMAGE) => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                image = Some((file_name, content_type, bytes));
            }
            Some(FIELD_STYLE_ID) => {
                style_id = Some(field.text().await.map_err(multipart_error)?);
            }
            Some(FIELD_FORMAT) => {
                format = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => continue,
        }
    }

    let (file_name, content_type, image) =
        image.ok_or_else(|| StubError::bad_request(SOURCE, "Missing image."))?;
    if image.is_empty() {
        return Err(StubError::bad_request(SOURCE, "Image is empty."));
    }

    let style_id = style_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| StubError::bad_request(SOURCE, "Missing styleId."))?;
    let format = format
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| StubError::bad_request(SOURCE, "Missing format."))?;

    Ok(RenderSubmission {
        file_name,
        content_type,
        image,
        style_id,
        format,
    })
}

fn multipart_error(err: MultipartError) -> StubError {
    let status = err.status();
    error!(
        target = SOURCE,
        status = status.as_u16(),
        error = %err,
        "failed to read multipart payload"
    );
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "Upload is too large."
    } else {
        "Malformed multipart form."
    };
    StubError::new(SOURCE, status, message).with_detail(err.body_text())
}
