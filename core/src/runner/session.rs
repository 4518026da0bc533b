//! One proxied run: Starting → Running → Draining → Terminated.
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::{resolve_dir, AppConfig};
use crate::error::{SessionError, SinkError, StartupError, StreamError};
use crate::transcript;
use crate::util::{RingBytes, SessionStamp};

use super::exit::normalize_exit;
use super::relay::{spawn_relay, ChunkTap, RelayOptions};
use super::sink::LogSink;
use super::traits::{ChildSession, Launcher};
use super::types::{ExitStatus, LaunchSpec, RelayReport, SessionReport, Signal, StreamRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Starting,
    Running,
    Draining,
    Terminated,
}

/// Everything a session needs to know up front. Immutable once the session starts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub stamp: SessionStamp,
    pub launch: LaunchSpec,
    pub log_dir: PathBuf,
    pub chunk_size: usize,
    pub transcript: bool,
    pub drain_timeout: Option<Duration>,
    pub stderr_tail_bytes: usize,
    pub tap_channel_capacity: usize,
}

impl SessionConfig {
    pub fn new(launch: LaunchSpec, log_dir: impl Into<PathBuf>) -> Self {
        Self::from_app_config(&AppConfig::default(), launch).with_log_dir(log_dir)
    }

    pub fn from_app_config(cfg: &AppConfig, launch: LaunchSpec) -> Self {
        Self {
            stamp: SessionStamp::now(),
            launch,
            log_dir: resolve_dir(&cfg.capture.log_dir),
            chunk_size: cfg.capture.chunk_size,
            transcript: cfg.capture.transcript,
            drain_timeout: cfg.capture.drain_timeout_ms.map(Duration::from_millis),
            stderr_tail_bytes: cfg.capture.stderr_tail_bytes,
            tap_channel_capacity: cfg.control.tap_channel_capacity,
        }
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }
}

/// The controlling process's side of the three streams.
pub struct ControllerIo {
    pub stdin: Box<dyn AsyncRead + Unpin + Send>,
    pub stdout: Box<dyn AsyncWrite + Unpin + Send>,
    pub stderr: Box<dyn AsyncWrite + Unpin + Send>,
}

impl ControllerIo {
    /// This process's own stdin, stdout and stderr.
    pub fn process() -> Self {
        Self {
            stdin: Box::new(tokio::io::stdin()),
            stdout: Box::new(tokio::io::stdout()),
            stderr: Box::new(tokio::io::stderr()),
        }
    }
}

struct Sinks {
    stdin: LogSink,
    stdout: LogSink,
    stderr: LogSink,
}

impl Sinks {
    async fn open(dir: &Path, stamp: &SessionStamp) -> Result<Self, StartupError> {
        let mut created = Vec::with_capacity(3);
        let res = async {
            let stdin = LogSink::open(dir, StreamRole::Stdin, stamp).await?;
            created.push(stdin.path().to_path_buf());
            let stdout = LogSink::open(dir, StreamRole::Stdout, stamp).await?;
            created.push(stdout.path().to_path_buf());
            let stderr = LogSink::open(dir, StreamRole::Stderr, stamp).await?;
            Ok::<_, SinkError>(Self {
                stdin,
                stdout,
                stderr,
            })
        }
        .await;

        match res {
            Ok(sinks) => Ok(sinks),
            Err(e) => {
                discard(created).await;
                Err(e.into())
            }
        }
    }

    fn paths(&self) -> Vec<PathBuf> {
        [&self.stdin, &self.stdout, &self.stderr]
            .iter()
            .map(|s| s.path().to_path_buf())
            .collect()
    }
}

/// Best-effort removal of files a failed startup created; they never saw child I/O.
async fn discard(paths: impl IntoIterator<Item = PathBuf>) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::debug!(path = %path.display(), error = %e, "remove of unused log failed");
        }
    }
}

/// A started session: log sinks open and child running, relays not yet wired.
pub struct ProxySession {
    id: String,
    config: SessionConfig,
    child: Box<dyn ChildSession>,
    sinks: Sinks,
    transcript: Option<(PathBuf, tokio::fs::File)>,
}

impl ProxySession {
    /// Open the log directory and sinks, then spawn the child. Nothing is spawned unless
    /// every sink opened, and no log file survives a failed spawn.
    pub async fn start(
        config: SessionConfig,
        launcher: &dyn Launcher,
    ) -> Result<Self, StartupError> {
        let id = uuid::Uuid::new_v4().to_string();
        let stamp = config.stamp.clone();
        tracing::debug!(session_id = %id, phase = ?SessionPhase::Starting, log_dir = %config.log_dir.display());

        tokio::fs::create_dir_all(&config.log_dir)
            .await
            .map_err(|source| StartupError::LogDir {
                path: config.log_dir.clone(),
                source,
            })?;

        let sinks = Sinks::open(&config.log_dir, &stamp).await?;

        let transcript = if config.transcript {
            let path = transcript::transcript_path(&config.log_dir, &stamp);
            match transcript::open_transcript(&path).await {
                Ok(file) => Some((path, file)),
                Err(source) => {
                    discard(sinks.paths()).await;
                    return Err(StartupError::LogDir { path, source });
                }
            }
        } else {
            None
        };

        let child = match launcher.spawn(&config.launch).await {
            Ok(child) => child,
            Err(e) => {
                let mut unused = sinks.paths();
                unused.extend(transcript.map(|(path, _)| path));
                discard(unused).await;
                return Err(e);
            }
        };

        tracing::info!(
            session_id = %id,
            pid = ?child.id(),
            cmd = %config.launch.cmd,
            args = ?config.launch.args,
            launcher = launcher.name(),
            "child started"
        );

        Ok(Self {
            id,
            config,
            child,
            sinks,
            transcript,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stamp(&self) -> &SessionStamp {
        &self.config.stamp
    }

    /// Raw stream logs, in stdin, stdout, stderr order.
    pub fn log_paths(&self) -> Vec<PathBuf> {
        self.sinks.paths()
    }

    pub fn transcript_path(&self) -> Option<&Path> {
        self.transcript.as_ref().map(|(p, _)| p.as_path())
    }

    /// Relay until the child exits and its output drains.
    ///
    /// Signals arriving on `signals` are forwarded to the child; relay failures are
    /// collected into the report and never end the child early.
    pub async fn run(
        self,
        io: ControllerIo,
        mut signals: mpsc::Receiver<Signal>,
    ) -> Result<SessionReport, SessionError> {
        let ProxySession {
            id,
            config,
            mut child,
            sinks,
            transcript,
        } = self;
        let started_at = Instant::now();

        let (tap_tx, transcript_task) = match transcript {
            Some((_, file)) => {
                let (tx, rx) = mpsc::channel::<ChunkTap>(config.tap_channel_capacity.max(1));
                (Some(tx), Some(transcript::spawn_transcript_writer(file, rx)))
            }
            None => (None, None),
        };

        let child_stdin = child.stdin().unwrap_or_else(|| {
            tracing::warn!(session_id = %id, "child has no stdin pipe");
            Box::new(tokio::io::sink()) as Box<dyn AsyncWrite + Unpin + Send>
        });
        let child_stdout = child.stdout().unwrap_or_else(|| {
            tracing::warn!(session_id = %id, "child has no stdout pipe");
            Box::new(tokio::io::empty()) as Box<dyn AsyncRead + Unpin + Send>
        });
        let child_stderr = child.stderr().unwrap_or_else(|| {
            tracing::warn!(session_id = %id, "child has no stderr pipe");
            Box::new(tokio::io::empty()) as Box<dyn AsyncRead + Unpin + Send>
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        let stderr_ring = RingBytes::new(config.stderr_tail_bytes);

        let in_task = spawn_relay(
            StreamRole::Stdin,
            io.stdin,
            sinks.stdin,
            child_stdin,
            RelayOptions {
                chunk_size: config.chunk_size,
                stop: Some(stop_rx),
                tap: tap_tx.clone(),
                ring: None,
            },
        );
        let out_task = spawn_relay(
            StreamRole::Stdout,
            child_stdout,
            sinks.stdout,
            io.stdout,
            RelayOptions {
                chunk_size: config.chunk_size,
                stop: None,
                tap: tap_tx.clone(),
                ring: None,
            },
        );
        let err_task = spawn_relay(
            StreamRole::Stderr,
            child_stderr,
            sinks.stderr,
            io.stderr,
            RelayOptions {
                chunk_size: config.chunk_size,
                stop: None,
                tap: tap_tx,
                ring: Some(stderr_ring.clone()),
            },
        );
        tracing::debug!(session_id = %id, phase = ?SessionPhase::Running);

        let waited = loop {
            tokio::select! {
                res = child.wait() => break res,
                Some(sig) = signals.recv() => {
                    match child.signal(sig).await {
                        Ok(()) => tracing::info!(session_id = %id, signal = ?sig, "forwarded signal to child"),
                        Err(e) => tracing::warn!(session_id = %id, signal = ?sig, error = %e, "forwarding signal failed"),
                    }
                }
            }
        };

        let status = match waited {
            Ok(status) => Ok(status),
            Err(e) => {
                tracing::error!(session_id = %id, error = %e, "waiting for child failed; killing it");
                let _ = child.signal(Signal::Kill).await;
                Err(SessionError::Wait(e.to_string()))
            }
        };

        tracing::debug!(session_id = %id, phase = ?SessionPhase::Draining);
        // The controller may still be writing; its stdin never has to reach EOF.
        let _ = stop_tx.send(true);

        let deadline = config.drain_timeout.map(|d| tokio::time::Instant::now() + d);
        let mut relays = Vec::with_capacity(3);
        let mut stream_errors = Vec::new();
        for (role, task) in [
            (StreamRole::Stdout, out_task),
            (StreamRole::Stderr, err_task),
            (StreamRole::Stdin, in_task),
        ] {
            match join_relay(role, task, deadline).await {
                Ok(report) => {
                    if let Some(e) = report.log_error.as_deref() {
                        tracing::warn!(session_id = %id, stream = %role, error = e, "stream was only partly logged");
                    }
                    relays.push(report);
                }
                Err(e) => {
                    tracing::warn!(session_id = %id, error = %e, "relay failed");
                    stream_errors.push(e);
                }
            }
        }
        drop(stop_tx);

        if let Some(task) = transcript_task {
            match task.await {
                Ok(Ok(entries)) => tracing::debug!(session_id = %id, entries, "transcript closed"),
                Ok(Err(e)) => tracing::warn!(session_id = %id, error = %e, "transcript write failed"),
                Err(e) => tracing::warn!(session_id = %id, error = %e, "transcript task failed"),
            }
        }

        let status: ExitStatus = status?;
        let exit_code = normalize_exit(status);
        tracing::debug!(session_id = %id, phase = ?SessionPhase::Terminated, exit_code);

        Ok(SessionReport {
            session_id: id,
            status,
            exit_code,
            relays,
            stream_errors,
            stderr_tail: stderr_ring.tail_lossy(),
            duration_ms: started_at.elapsed().as_millis() as u64,
        })
    }
}

async fn join_relay(
    role: StreamRole,
    mut task: JoinHandle<Result<RelayReport, StreamError>>,
    deadline: Option<tokio::time::Instant>,
) -> Result<RelayReport, StreamError> {
    let joined = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort();
                return Err(StreamError::join(
                    role,
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "drain timed out"),
                ));
            }
        },
        None => task.await,
    };
    match joined {
        Ok(res) => res,
        Err(e) => Err(StreamError::join(role, std::io::Error::other(e.to_string()))),
    }
}
