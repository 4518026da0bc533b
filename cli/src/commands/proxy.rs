use stdio_tap_core::config::{self, AppConfig};
use stdio_tap_core::error::CliError;
use stdio_tap_core::runner::{
    run_session, signal, ControllerIo, LaunchSpec, ProcessLauncher, RunSessionArgs,
    SessionConfig, SessionReport,
};

use super::cli::Args;

/// Config file, then environment, then flags.
pub fn load_config(args: &Args) -> Result<AppConfig, CliError> {
    let cfg = match args.config.as_deref() {
        Some(path) => config::load_from_path(path)
            .map(|cfg| config::apply_env_overrides(cfg, |key| std::env::var(key).ok())),
        None => config::load_default(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(apply_flags(cfg, args))
}

fn apply_flags(mut cfg: AppConfig, args: &Args) -> AppConfig {
    if let Some(dir) = args.log_dir.as_deref() {
        cfg.capture.log_dir = dir.to_string();
    }
    if args.transcript {
        cfg.capture.transcript = true;
    }
    if let Some(ms) = args.drain_timeout_ms {
        cfg.capture.drain_timeout_ms = Some(ms);
    }
    if args.quiet {
        cfg.logging.console = false;
    }
    cfg
}

pub fn session_config(cfg: &AppConfig, args: &Args) -> SessionConfig {
    let launch = LaunchSpec::new(args.program(), args.program_args());
    SessionConfig::from_app_config(cfg, launch)
}

pub async fn run(cfg: &AppConfig, session: SessionConfig) -> Result<i32, CliError> {
    let (sig_tx, sig_rx) = signal::signal_channel();
    let forwarder = if cfg.control.forward_signals {
        Some(signal::install_os_forwarder(sig_tx)?)
    } else {
        drop(sig_tx);
        None
    };

    let launcher = ProcessLauncher::new();
    let res = run_session(RunSessionArgs {
        config: session,
        launcher: &launcher,
        io: ControllerIo::process(),
        signals: sig_rx,
    })
    .await;

    if let Some(task) = forwarder {
        task.abort();
    }

    let report = res?;
    summarize(&report);
    Ok(report.exit_code)
}

fn summarize(report: &SessionReport) {
    let bytes = |role| report.relay(role).map(|r| r.bytes_relayed).unwrap_or(0);
    tracing::info!(
        session_id = %report.session_id,
        exit_code = report.exit_code,
        status = ?report.status,
        stdin_bytes = bytes(stdio_tap_core::runner::StreamRole::Stdin),
        stdout_bytes = bytes(stdio_tap_core::runner::StreamRole::Stdout),
        stderr_bytes = bytes(stdio_tap_core::runner::StreamRole::Stderr),
        duration_ms = report.duration_ms,
        "session finished"
    );

    for e in &report.stream_errors {
        tracing::warn!(session_id = %report.session_id, error = %e, "stream did not finish cleanly");
    }

    if report.exit_code != 0 && !report.stderr_tail.trim().is_empty() {
        tracing::warn!(
            session_id = %report.session_id,
            stderr_tail = %report.stderr_tail.trim_end(),
            "child exited with failure"
        );
    }
}
