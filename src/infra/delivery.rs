//! Local delivery targets: a download directory and an external share command.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::{
    fs,
    io::{AsyncWrite, AsyncWriteExt},
    process::Command,
};
use tracing::{debug, info, warn};

use crate::application::delivery::{
    Delivery, DeliveryError, DownloadTarget, RenderedFile, ShareOutcome, ShareTarget,
};
use crate::config::{DeliverySettings, ShareCommand};

const SOURCE: &str = "tryon::infra::delivery";
const MAX_NAME_ATTEMPTS: u32 = 1_000;

/// Build the delivery strategy from configuration: share-capable when a share
/// command is configured, download-only otherwise.
pub fn build_delivery(settings: &DeliverySettings) -> Delivery {
    let download: Arc<dyn DownloadTarget> =
        Arc::new(DirectoryDownload::new(settings.download_dir.clone()));
    match settings.share.as_ref() {
        Some(command) => Delivery::ShareCapable {
            share: Arc::new(CommandShare::from_settings(command)),
            download,
        },
        None => Delivery::DownloadOnly { download },
    }
}

/// Saves into a directory, never overwriting: `name.jpg`, `name (1).jpg`, ...
#[derive(Debug, Clone)]
pub struct DirectoryDownload {
    directory: PathBuf,
}

impl DirectoryDownload {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[async_trait]
impl DownloadTarget for DirectoryDownload {
    async fn save(&self, file: &RenderedFile) -> Result<PathBuf, DeliveryError> {
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|err| DeliveryError::Save(format!("{}: {err}", self.directory.display())))?;

        let file_name = sanitize_file_name(&file.name);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = self.directory.join(numbered_name(&file_name, attempt));
            let handle = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(handle) => handle,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(DeliveryError::Save(format!(
                        "{}: {err}",
                        candidate.display()
                    )));
                }
            };

            fill_or_discard(handle, &candidate, &file.bytes).await?;

            info!(
                target = SOURCE,
                path = %candidate.display(),
                bytes = file.bytes.len(),
                "finished image saved"
            );
            return Ok(candidate);
        }

        Err(DeliveryError::Save(format!(
            "no free file name for {file_name} in {}",
            self.directory.display()
        )))
    }
}

/// Writes `bytes` into a file just created at `path`. A failed write removes
/// the file so no truncated image is left behind.
async fn fill_or_discard<W>(mut writer: W, path: &Path, bytes: &[u8]) -> Result<(), DeliveryError>
where
    W: AsyncWrite + Unpin,
{
    let written = match writer.write_all(bytes).await {
        Ok(()) => writer.flush().await,
        Err(err) => Err(err),
    };
    drop(writer);

    let Err(err) = written else {
        return Ok(());
    };
    if let Err(remove_err) = fs::remove_file(path).await {
        warn!(
            target = SOURCE,
            path = %path.display(),
            error = %remove_err,
            "could not remove partially written image"
        );
    }
    Err(DeliveryError::Save(format!("{}: {err}", path.display())))
}

/// Hands the file to an external program, e.g. a messaging or AirDrop helper.
///
/// The file is written to a private temporary directory and its path appended
/// to the configured arguments. The directory is removed once the program
/// exits, so the program must be done with the file by then. Exit status zero
/// counts as shared; anything else as cancelled.
#[derive(Debug, Clone)]
pub struct CommandShare {
    program: String,
    args: Vec<String>,
}

impl CommandShare {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_settings(command: &ShareCommand) -> Self {
        Self::new(command.program.clone(), command.args.clone())
    }
}

#[async_trait]
impl ShareTarget for CommandShare {
    async fn share(&self, file: &RenderedFile) -> Result<ShareOutcome, DeliveryError> {
        let staging = tempfile::Builder::new()
            .prefix("tryon-share-")
            .tempdir()
            .map_err(|err| DeliveryError::Share(err.to_string()))?;
        let path = staging.path().join(sanitize_file_name(&file.name));
        fs::write(&path, &file.bytes)
            .await
            .map_err(|err| DeliveryError::Share(err.to_string()))?;

        debug!(
            target = SOURCE,
            program = %self.program,
            path = %path.display(),
            "running share command"
        );

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .env("TRYON_SHARE_TITLE", &file.title)
            .env("TRYON_SHARE_TEXT", &file.text)
            .env("TRYON_SHARE_CONTENT_TYPE", file.content_type)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|err| DeliveryError::Share(format!("{}: {err}", self.program)))?;

        if status.success() {
            Ok(ShareOutcome::Shared)
        } else {
            debug!(target = SOURCE, status = %status, "share command did not complete");
            Ok(ShareOutcome::Cancelled)
        }
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "preview.jpg".to_string()
    } else {
        cleaned
    }
}

fn numbered_name(name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({attempt}).{ext}"),
        _ => format!("{name} ({attempt})"),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::domain::styles::StyleCatalog;

    fn rendered(bytes: &'static [u8]) -> RenderedFile {
        let style = StyleCatalog::standard().find("mid-fade");
        RenderedFile::for_style(style, Bytes::from_static(bytes))
    }

    #[test]
    fn numbered_names_keep_the_extension() {
        assert_eq!(numbered_name("a.jpg", 0), "a.jpg");
        assert_eq!(numbered_name("a.jpg", 2), "a (2).jpg");
        assert_eq!(numbered_name("noext", 1), "noext (1)");
        assert_eq!(numbered_name(".hidden", 1), ".hidden (1)");
    }

    #[test]
    fn file_names_cannot_escape_the_directory() {
        assert_eq!(sanitize_file_name("../x/y.jpg"), "_x_y.jpg");
        assert_eq!(sanitize_file_name("  "), "preview.jpg");
    }

    #[tokio::test]
    async fn directory_download_never_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = DirectoryDownload::new(dir.path());

        let first = target.save(&rendered(b"one")).await.expect("first save");
        let second = target.save(&rendered(b"two")).await.expect("second save");

        assert_eq!(
            first.file_name().and_then(|n| n.to_str()),
            Some("wediddat-preview-mid-fade.jpg")
        );
        assert_eq!(
            second.file_name().and_then(|n| n.to_str()),
            Some("wediddat-preview-mid-fade (1).jpg")
        );
        assert_eq!(std::fs::read(&first).expect("read first"), b"one");
        assert_eq!(std::fs::read(&second).expect("read second"), b"two");
    }

    struct FailingWriter;

    impl AsyncWrite for FailingWriter {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::other("disk full")))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn failed_write_removes_the_partial_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wediddat-preview-mid-fade.jpg");
        std::fs::write(&path, b"\xff\xd8").expect("partial file");

        let err = fill_or_discard(FailingWriter, &path, b"rendered")
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Save(ref message) if message.contains("disk full")));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn successful_write_keeps_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.jpg");
        let handle = fs::File::create(&path).await.expect("create");

        fill_or_discard(handle, &path, b"rendered")
            .await
            .expect("written");

        assert_eq!(std::fs::read(&path).expect("read"), b"rendered");
    }

    #[tokio::test]
    async fn directory_download_creates_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        let target = DirectoryDownload::new(&nested);

        let saved = target.save(&rendered(b"img")).await.expect("save");
        assert!(saved.starts_with(&nested));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_share_reports_exit_status() {
        let ok = CommandShare::new("true", Vec::new());
        assert_eq!(
            ok.share(&rendered(b"img")).await.expect("runs"),
            ShareOutcome::Shared
        );

        let cancelled = CommandShare::new("false", Vec::new());
        assert_eq!(
            cancelled.share(&rendered(b"img")).await.expect("runs"),
            ShareOutcome::Cancelled
        );
    }

    #[tokio::test]
    async fn command_share_missing_program_is_an_error() {
        let share = CommandShare::new("tryon-no-such-share-helper", Vec::new());
        let err = share.share(&rendered(b"img")).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Share(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn share_falls_back_to_download_when_cancelled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let delivery = build_delivery(&DeliverySettings {
            download_dir: dir.path().to_path_buf(),
            share: Some(ShareCommand {
                program: "false".to_string(),
                args: Vec::new(),
            }),
        });
        assert_eq!(delivery.kind(), "share_capable");

        let outcome = delivery
            .deliver(&rendered(b"img"))
            .await
            .expect("delivered");
        match outcome {
            crate::application::delivery::DeliveryOutcome::Downloaded { location } => {
                assert!(location.starts_with(dir.path()));
            }
            other => panic!("expected download, got {other:?}"),
        }
    }

    #[test]
    fn no_share_command_means_download_only() {
        let delivery = build_delivery(&DeliverySettings {
            download_dir: PathBuf::from("."),
            share: None,
        });
        assert_eq!(delivery.kind(), "download_only");
    }
}
