//! Request and response shapes for the render job endpoints.
//!
//! Shared by the `tryon` HTTP client and the placeholder render server so both
//! sides agree on field names.

use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};

/// Job creation endpoint (`POST`, multipart).
pub const RENDER_JOBS_PATH: &str = "api/render";

/// Multipart part carrying the selfie bytes.
pub const FIELD_IMAGE: &str = "image";
/// Multipart part carrying the catalog style identifier.
pub const FIELD_STYLE_ID: &str = "styleId";
/// Multipart part carrying the requested output format.
pub const FIELD_FORMAT: &str = "format";

/// Value of the `format` part. Results are always requested as JPEG.
pub const DEFAULT_OUTPUT_FORMAT: &str = "jpg";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRenderJobResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    Pending,
    Done,
    Failed,
    /// Any status string this client does not know about. Also stands in
    /// for a missing, `null` or non-string status.
    #[default]
    #[serde(other)]
    Unknown,
}

fn lenient_status<'de, D>(deserializer: D) -> Result<RenderStatus, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireStatus {
        Known(RenderStatus),
        Other(IgnoredAny),
    }

    Ok(match Option::<WireStatus>::deserialize(deserializer)? {
        Some(WireStatus::Known(status)) => status,
        Some(WireStatus::Other(IgnoredAny)) | None => RenderStatus::Unknown,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderJobStatusResponse {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: RenderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error payload returned by the render endpoints on non-success statuses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RenderErrorBody {
    pub error: String,
}
