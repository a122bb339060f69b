use std::{error::Error as StdError, path::Path, process, sync::Arc};

use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use tryon::{
    application::{
        access::{AccessGate, WRONG_PIN_MESSAGE},
        error::AppError,
        render::{RenderOrchestrator, RenderTiming, TokioClock},
        session::Session,
    },
    config,
    domain::{selfie::Selfie, styles::StyleCatalog},
    infra::{
        delivery::build_delivery, error::InfraError, http, render_client::HttpRenderApi,
        telemetry,
    },
};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const PIN_ENV: &str = "TRYON_PIN";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("{}", error.presentation_message());
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let cause = StdError::source(error).map(ToString::to_string);
    if dispatcher::has_been_set() {
        error!(error = %error, cause = ?cause, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, cause = ?cause, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::from(InfraError::settings(err.to_string())))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Styles => run_styles(),
        config::Command::Send(args) => run_send(settings, *args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let body_limit = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| AppError::from(InfraError::settings("upload limit out of range")))?;
    let router = http::build_router(body_limit);

    let addr = settings.server.addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::from(InfraError::Listen { addr, source }))?;
    info!(
        target = "tryon::serve",
        addr = %settings.server.addr,
        body_limit,
        "placeholder render API listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target = "tryon::serve", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "tryon::serve", "shutting down");
}

fn run_styles() -> Result<(), AppError> {
    let catalog = StyleCatalog::standard();
    let styles: Vec<_> = catalog.iter().collect();
    print_json(&styles)
}

async fn run_send(settings: config::Settings, args: config::SendArgs) -> Result<(), AppError> {
    let catalog = StyleCatalog::standard();
    let mut session = Session::new(AccessGate::new(settings.access.pin.clone()), &catalog);

    let candidate = read_pin(&args).await?;
    if !session.unlock(&AccessGate::sanitize(&candidate)) {
        return Err(AppError::Access(WRONG_PIN_MESSAGE));
    }

    session.set_selfie(load_selfie(&args.selfie).await?);

    let style = session.select_style(&catalog, &args.style);
    if style.id != args.style {
        warn!(
            target = "tryon::send",
            requested = %args.style,
            using = style.id,
            "unknown style; using the first catalog style"
        );
    }

    let api = HttpRenderApi::from_settings(&settings.render)?;
    let orchestrator = RenderOrchestrator::new(
        Arc::new(api),
        Arc::new(TokioClock::new()),
        build_delivery(&settings.delivery),
        RenderTiming::from(&settings.render),
    );

    let report = orchestrator.send(&mut session, &catalog).await?;
    print_json(&report)
}

async fn read_pin(args: &config::SendArgs) -> Result<String, AppError> {
    if let Some(path) = args.pin_file.as_ref() {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| AppError::from(InfraError::read_file(path, err)))?;
        return Ok(contents.trim().to_string());
    }

    std::env::var(PIN_ENV)
        .map(|pin| pin.trim().to_string())
        .map_err(|_| AppError::validation("Staff PIN required (use --pin-file or TRYON_PIN)."))
}

async fn load_selfie(path: &Path) -> Result<Selfie, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| AppError::from(InfraError::read_file(path, err)))?;
    let content_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE);
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    Ok(Selfie::new(file_name, content_type, bytes)?)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
