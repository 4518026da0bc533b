use std::path::Path;

use clap::Parser;
mod commands;
use commands::{cli, proxy};
use stdio_tap_core::config::{resolve_dir, LoggingConfig};
use stdio_tap_core::error::{CliError, SessionError, StartupError};
use stdio_tap_core::runner::exit::{PROXY_FAILURE_EXIT_CODE, SPAWN_FAILURE_EXIT_CODE};
use stdio_tap_core::util::SessionStamp;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> =
    std::sync::Mutex::new(None);

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    let quiet = args.quiet;

    let exit = match real_main(args).await {
        Ok(code) => code,
        Err(e) => {
            if tracing::dispatcher::has_been_set() {
                tracing::error!(error = %e, "stdio-tap failed");
            } else if !quiet {
                eprintln!("stdio-tap: {e}");
            }
            exit_code_for_error(&e)
        }
    };

    // Flush the file log, then leave without waiting on the blocking stdin reader.
    if let Ok(mut guard) = LOG_GUARD.lock() {
        guard.take();
    }
    std::process::exit(exit);
}

async fn real_main(args: cli::Args) -> Result<i32, CliError> {
    let cfg = proxy::load_config(&args)?;
    let session = proxy::session_config(&cfg, &args);

    let log_dir = cfg
        .logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(resolve_dir)
        .unwrap_or_else(|| session.log_dir.clone());
    init_tracing(&cfg.logging, &log_dir, &session.stamp)?;

    proxy::run(&cfg, session).await
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // child's own code: normal completion (returned as Ok)
    // 125: proxy failure (config, log directory, internal)
    // 127: child could not be spawned
    match e {
        CliError::Session(SessionError::Startup(StartupError::Spawn { .. })) => {
            SPAWN_FAILURE_EXIT_CODE
        }
        CliError::Session(_) => PROXY_FAILURE_EXIT_CODE,
        CliError::Config(_) => PROXY_FAILURE_EXIT_CODE,
        CliError::Io(_) => PROXY_FAILURE_EXIT_CODE,
        CliError::Format(_) => PROXY_FAILURE_EXIT_CODE,
    }
}

/// Create the diagnostic log for this run. Failures surface as an unusable log
/// directory instead of aborting inside the appender.
fn open_log_file(dir: &Path, stamp: &SessionStamp) -> Result<std::fs::File, StartupError> {
    std::fs::create_dir_all(dir).map_err(|source| StartupError::LogDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(stamp.file_name("command-capture"));
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| StartupError::LogDir { path, source })
}

fn init_tracing(
    logging: &LoggingConfig,
    dir: &Path,
    stamp: &SessionStamp,
) -> Result<(), CliError> {
    if !logging.enabled || (!logging.console && !logging.file) {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone())
            .map_err(|e| CliError::Config(format!("logging.level: {e}")))?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let file = open_log_file(dir, stamp).map_err(SessionError::from)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        if let Ok(mut slot) = LOG_GUARD.lock() {
            *slot = Some(guard);
        }
        maybe_writer = Some(non_blocking);
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
