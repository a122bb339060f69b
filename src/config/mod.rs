//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::NonZeroU64,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::access::MAX_PIN_LEN;
use crate::application::render::RenderTiming;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tryon";
const ENV_PREFIX: &str = "TRYON";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8787;
const DEFAULT_RENDER_BASE_URL: &str = "http://127.0.0.1:8787/";
const DEFAULT_POLL_INTERVAL_MS: u64 = 900;
const DEFAULT_RENDER_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PIN: &str = "2330";
const DEFAULT_DOWNLOAD_DIR: &str = ".";
const DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES: u64 = 10 * 1024 * 1024;

/// Command-line arguments for the `tryon` binary.
#[derive(Debug, Parser)]
#[command(name = "tryon", version, about = "Barber try-on render tool")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TRYON_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the placeholder render API.
    Serve(ServeArgs),
    /// Print the style catalog as JSON.
    Styles,
    /// Render a selfie in a style and share or save the result.
    Send(Box<SendArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the maximum request size for render submissions in bytes.
    #[arg(long = "uploads-max-request-bytes", value_name = "BYTES")]
    pub uploads_max_request_bytes: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct SendArgs {
    /// Client selfie to render.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub selfie: PathBuf,

    /// Style identifier from the catalog; unknown ids use the first style.
    #[arg(long, value_name = "ID")]
    pub style: String,

    /// File containing the staff PIN. Without it the PIN is read from `TRYON_PIN`.
    #[arg(long, env = "TRYON_PIN_FILE", value_name = "PATH")]
    pub pin_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SendOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SendOverrides {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Override the render API base URL.
    #[arg(long = "render-base-url", value_name = "URL")]
    pub render_base_url: Option<String>,

    /// Override the status poll interval.
    #[arg(long = "render-poll-interval-ms", value_name = "MILLIS")]
    pub render_poll_interval_ms: Option<u64>,

    /// Override how long to wait for a render before giving up.
    #[arg(long = "render-timeout-ms", value_name = "MILLIS")]
    pub render_timeout_ms: Option<u64>,

    /// Override the directory finished images are saved to.
    #[arg(long = "download-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub download_dir: Option<PathBuf>,

    /// Override the share program; the saved file path is appended to its arguments.
    #[arg(long = "share-program", value_name = "PROGRAM")]
    pub share_program: Option<String>,

    /// Argument passed to the share program before the file path (repeatable).
    #[arg(
        long = "share-arg",
        value_name = "ARG",
        action = clap::ArgAction::Append,
        allow_hyphen_values = true
    )]
    pub share_args: Vec<String>,

    /// Skip sharing and always save locally.
    #[arg(long = "download-only", action = clap::ArgAction::SetTrue)]
    pub download_only: bool,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub render: RenderSettings,
    pub access: AccessSettings,
    pub delivery: DeliverySettings,
    pub uploads: UploadSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub base_url: Url,
    pub poll_interval: Duration,
    pub timeout: Duration,
    pub request_timeout: Duration,
}

impl From<&RenderSettings> for RenderTiming {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            poll_interval: settings.poll_interval,
            timeout: settings.timeout,
        }
    }
}

#[derive(Clone)]
pub struct AccessSettings {
    pub pin: String,
}

impl std::fmt::Debug for AccessSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessSettings").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub download_dir: PathBuf,
    pub share: Option<ShareCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareCommand {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_request_bytes: NonZeroU64,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Serve(args) => raw.apply_serve_overrides(&args.overrides),
        Command::Send(args) => raw.apply_send_overrides(&args.overrides),
        Command::Styles => {}
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    render: RawRenderSettings,
    access: RawAccessSettings,
    delivery: RawDeliverySettings,
    uploads: RawUploadSettings,
}

impl RawSettings {
    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        self.apply_logging_overrides(&overrides.logging);
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(limit) = overrides.uploads_max_request_bytes {
            self.uploads.max_request_bytes = Some(limit);
        }
    }

    fn apply_send_overrides(&mut self, overrides: &SendOverrides) {
        self.apply_logging_overrides(&overrides.logging);
        if let Some(url) = overrides.render_base_url.as_ref() {
            self.render.base_url = Some(url.clone());
        }
        if let Some(interval) = overrides.render_poll_interval_ms {
            self.render.poll_interval_ms = Some(interval);
        }
        if let Some(timeout) = overrides.render_timeout_ms {
            self.render.timeout_ms = Some(timeout);
        }
        if let Some(dir) = overrides.download_dir.as_ref() {
            self.delivery.download_dir = Some(dir.clone());
        }
        if let Some(program) = overrides.share_program.as_ref() {
            let mut command = vec![program.clone()];
            command.extend(overrides.share_args.iter().cloned());
            self.delivery.share_command = Some(command);
        }
        if overrides.download_only {
            self.delivery.share_command = Some(Vec::new());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            render,
            access,
            delivery,
            uploads,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            render: build_render_settings(render)?,
            access: build_access_settings(access)?,
            delivery: build_delivery_settings(delivery)?,
            uploads: build_upload_settings(uploads)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let raw_url = render
        .base_url
        .unwrap_or_else(|| DEFAULT_RENDER_BASE_URL.to_string());
    let mut base_url = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("render.base_url", err.to_string()))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "render.base_url",
            "scheme must be http or https",
        ));
    }
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }

    let poll_interval = positive_millis(
        render.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        "render.poll_interval_ms",
    )?;
    let timeout = positive_millis(
        render.timeout_ms.unwrap_or(DEFAULT_RENDER_TIMEOUT_MS),
        "render.timeout_ms",
    )?;

    let request_timeout_secs = render
        .request_timeout_seconds
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if request_timeout_secs == 0 {
        return Err(LoadError::invalid(
            "render.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(RenderSettings {
        base_url,
        poll_interval,
        timeout,
        request_timeout: Duration::from_secs(request_timeout_secs),
    })
}

fn build_access_settings(access: RawAccessSettings) -> Result<AccessSettings, LoadError> {
    let pin = access.pin.unwrap_or_else(|| DEFAULT_PIN.to_string());
    let pin = pin.trim().to_string();
    if pin.is_empty() || pin.len() > MAX_PIN_LEN || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(LoadError::invalid(
            "access.pin",
            format!("must be 1 to {MAX_PIN_LEN} digits"),
        ));
    }
    Ok(AccessSettings { pin })
}

fn build_delivery_settings(delivery: RawDeliverySettings) -> Result<DeliverySettings, LoadError> {
    let download_dir = delivery
        .download_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));
    if download_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "delivery.download_dir",
            "path must not be empty",
        ));
    }

    let share = match delivery.share_command {
        Some(mut command) if !command.is_empty() => {
            let program = command.remove(0);
            if program.trim().is_empty() {
                return Err(LoadError::invalid(
                    "delivery.share_command",
                    "program must not be empty",
                ));
            }
            Some(ShareCommand {
                program,
                args: command,
            })
        }
        _ => None,
    };

    Ok(DeliverySettings {
        download_dir,
        share,
    })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let max_request_bytes_value = uploads
        .max_request_bytes
        .unwrap_or(DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("uploads.max_request_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_request_bytes_value).map_err(|_| {
        LoadError::invalid(
            "uploads.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(UploadSettings { max_request_bytes })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    base_url: Option<String>,
    poll_interval_ms: Option<u64>,
    timeout_ms: Option<u64>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Clone, Deserialize, Default)]
#[serde(default)]
struct RawAccessSettings {
    pin: Option<String>,
}

impl std::fmt::Debug for RawAccessSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawAccessSettings")
            .field("pin_set", &self.pin.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDeliverySettings {
    download_dir: Option<PathBuf>,
    share_command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    max_request_bytes: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn positive_millis(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_millis(value))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
