//! Handing the finished image to the barber.
//!
//! Delivery is picked at runtime from what the environment can do: a share
//! target when one is configured, otherwise saving the file locally. A share
//! that is cancelled or fails falls through to the download path.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::styles::Style;

pub const RESULT_CONTENT_TYPE: &str = "image/jpeg";
pub const SHARE_TITLE: &str = "We Did Dat Preview";
pub const SHOP_NAME: &str = "We Did Dat Barbershop";

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("share target failed: {0}")]
    Share(String),
    #[error("could not save finished image: {0}")]
    Save(String),
}

/// The rendered image wrapped as a named file.
#[derive(Clone)]
pub struct RenderedFile {
    pub name: String,
    pub content_type: &'static str,
    pub bytes: Bytes,
    pub title: String,
    pub text: String,
}

impl RenderedFile {
    pub fn for_style(style: &Style, bytes: Bytes) -> Self {
        Self {
            name: format!("wediddat-preview-{}.jpg", style.id),
            content_type: RESULT_CONTENT_TYPE,
            bytes,
            title: SHARE_TITLE.to_string(),
            text: format!("{SHOP_NAME} • {}", style.name),
        }
    }
}

impl std::fmt::Debug for RenderedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    Cancelled,
}

#[async_trait]
pub trait ShareTarget: Send + Sync {
    /// Whether this target accepts the given file at all.
    fn can_share(&self, _file: &RenderedFile) -> bool {
        true
    }

    async fn share(&self, file: &RenderedFile) -> Result<ShareOutcome, DeliveryError>;
}

#[async_trait]
pub trait DownloadTarget: Send + Sync {
    /// Persist the file and return where it ended up.
    async fn save(&self, file: &RenderedFile) -> Result<PathBuf, DeliveryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Shared,
    Downloaded { location: PathBuf },
}

#[derive(Clone)]
pub enum Delivery {
    ShareCapable {
        share: Arc<dyn ShareTarget>,
        download: Arc<dyn DownloadTarget>,
    },
    DownloadOnly {
        download: Arc<dyn DownloadTarget>,
    },
}

impl Delivery {
    pub fn kind(&self) -> &'static str {
        match self {
            Delivery::ShareCapable { .. } => "share_capable",
            Delivery::DownloadOnly { .. } => "download_only",
        }
    }

    pub async fn deliver(&self, file: &RenderedFile) -> Result<DeliveryOutcome, DeliveryError> {
        let download = match self {
            Delivery::ShareCapable { share, download } => {
                if share.can_share(file) {
                    match share.share(file).await {
                        Ok(ShareOutcome::Shared) => {
                            info!(target = "tryon::delivery", file = %file.name, "result shared");
                            return Ok(DeliveryOutcome::Shared);
                        }
                        Ok(ShareOutcome::Cancelled) => {
                            debug!(
                                target = "tryon::delivery",
                                file = %file.name,
                                "share cancelled; saving instead"
                            );
                        }
                        Err(err) => {
                            warn!(
                                target = "tryon::delivery",
                                file = %file.name,
                                error = %err,
                                "share failed; saving instead"
                            );
                        }
                    }
                }
                download
            }
            Delivery::DownloadOnly { download } => download,
        };

        let location = download.save(file).await?;
        info!(
            target = "tryon::delivery",
            file = %file.name,
            location = %location.display(),
            "result saved"
        );
        Ok(DeliveryOutcome::Downloaded { location })
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeShare, MemoryDownload};
    use super::*;
    use crate::domain::styles::StyleCatalog;

    fn file() -> RenderedFile {
        let style = StyleCatalog::standard().find("mid-fade");
        RenderedFile::for_style(style, Bytes::from_static(b"jpeg"))
    }

    #[test]
    fn rendered_file_is_named_after_style() {
        let file = file();
        assert_eq!(file.name, "wediddat-preview-mid-fade.jpg");
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(file.text, "We Did Dat Barbershop • Mid Fade");
    }

    #[tokio::test]
    async fn share_success_skips_download() {
        let share = FakeShare::answering(Ok(ShareOutcome::Shared));
        let download = Arc::new(MemoryDownload::default());
        let delivery = Delivery::ShareCapable {
            share: share.clone(),
            download: download.clone(),
        };

        let outcome = delivery.deliver(&file()).await.expect("delivered");
        assert_eq!(outcome, DeliveryOutcome::Shared);
        assert!(download.saved.lock().expect("log").is_empty());
    }

    #[tokio::test]
    async fn cancelled_share_falls_back_to_download() {
        let share = FakeShare::answering(Ok(ShareOutcome::Cancelled));
        let download = Arc::new(MemoryDownload::default());
        let delivery = Delivery::ShareCapable {
            share: share.clone(),
            download: download.clone(),
        };

        let outcome = delivery.deliver(&file()).await.expect("delivered");
        assert_eq!(
            outcome,
            DeliveryOutcome::Downloaded {
                location: PathBuf::from("/downloads/wediddat-preview-mid-fade.jpg")
            }
        );
        assert_eq!(share.shared.lock().expect("log").len(), 1);
        assert_eq!(download.saved.lock().expect("log").len(), 1);
    }

    #[tokio::test]
    async fn share_error_falls_back_to_download() {
        let share = FakeShare::answering(Err("no handler".into()));
        let download = Arc::new(MemoryDownload::default());
        let delivery = Delivery::ShareCapable {
            share,
            download: download.clone(),
        };

        let outcome = delivery.deliver(&file()).await.expect("delivered");
        assert!(matches!(outcome, DeliveryOutcome::Downloaded { .. }));
    }

    #[tokio::test]
    async fn unsupported_file_is_not_offered_to_share_target() {
        let share = Arc::new(FakeShare {
            accepts: false,
            answer: Ok(ShareOutcome::Shared),
            shared: std::sync::Mutex::new(Vec::new()),
        });
        let download = Arc::new(MemoryDownload::default());
        let delivery = Delivery::ShareCapable {
            share: share.clone(),
            download,
        };

        let outcome = delivery.deliver(&file()).await.expect("delivered");
        assert!(matches!(outcome, DeliveryOutcome::Downloaded { .. }));
        assert!(share.shared.lock().expect("log").is_empty());
    }

    #[tokio::test]
    async fn download_failure_is_reported() {
        let delivery = Delivery::DownloadOnly {
            download: Arc::new(MemoryDownload {
                fail: true,
                ..Default::default()
            }),
        };

        let err = delivery.deliver(&file()).await.expect_err("save fails");
        assert!(matches!(err, DeliveryError::Save(_)));
    }
}
