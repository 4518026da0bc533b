#![allow(dead_code)]

use std::path::{Path, PathBuf};

use stdio_tap_core::runner::{
    ControllerIo, LaunchSpec, ProcessLauncher, ProxySession, SessionConfig,
    SessionReport, Signal, StreamRole,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub fn sh(script: &str) -> LaunchSpec {
    LaunchSpec::new("sh", vec!["-c".to_string(), script.to_string()])
}

/// What the controller side saw, plus the finished session.
pub struct Run {
    pub report: SessionReport,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub log_paths: Vec<PathBuf>,
    pub transcript: Option<PathBuf>,
}

impl Run {
    pub fn log(&self, role: StreamRole) -> Vec<u8> {
        let idx = match role {
            StreamRole::Stdin => 0,
            StreamRole::Stdout => 1,
            StreamRole::Stderr => 2,
        };
        std::fs::read(&self.log_paths[idx]).expect("stream log readable")
    }
}

pub enum Input {
    /// Write the bytes, then close the controller's stdin.
    Closed(Vec<u8>),
    /// Write the bytes and keep the controller's stdin open for the whole session.
    Open(Vec<u8>),
}

fn reader(mut rd: DuplexStream) -> JoinHandle<Vec<u8>> {
    tokio::spawn(async move {
        let mut buf = Vec::new();
        rd.read_to_end(&mut buf).await.expect("controller read");
        buf
    })
}

pub async fn run(config: SessionConfig, input: Input, signals: Vec<Signal>) -> Run {
    let (mut in_wr, in_rd) = tokio::io::duplex(64 * 1024);
    let (out_wr, out_rd) = tokio::io::duplex(64 * 1024);
    let (err_wr, err_rd) = tokio::io::duplex(64 * 1024);

    let (bytes, keep_open) = match input {
        Input::Closed(b) => (b, false),
        Input::Open(b) => (b, true),
    };
    let (held_tx, held_rx) = tokio::sync::oneshot::channel::<()>();
    let writer = tokio::spawn(async move {
        // The child may exit before reading everything; a short write is fine then.
        let _ = in_wr.write_all(&bytes).await;
        if keep_open {
            let _ = held_rx.await;
        }
        drop(in_wr);
    });

    let out_task = reader(out_rd);
    let err_task = reader(err_rd);

    let launcher = ProcessLauncher::new();
    let session = ProxySession::start(config, &launcher)
        .await
        .expect("session starts");
    let log_paths = session.log_paths();
    let transcript = session.transcript_path().map(Path::to_path_buf);

    let (sig_tx, sig_rx) = mpsc::channel(8);
    for sig in signals {
        sig_tx.send(sig).await.unwrap();
    }

    let io = ControllerIo {
        stdin: Box::new(in_rd),
        stdout: Box::new(out_wr),
        stderr: Box::new(err_wr),
    };
    let report = session.run(io, sig_rx).await.expect("session runs");

    let stdout = out_task.await.unwrap();
    let stderr = err_task.await.unwrap();
    let _ = held_tx.send(());
    writer.await.unwrap();
    drop(sig_tx);

    Run {
        report,
        stdout,
        stderr,
        log_paths,
        transcript,
    }
}

pub fn stream_logs_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            let name = p.file_name().unwrap().to_string_lossy().to_string();
            name.starts_with("mcp-")
        })
        .collect()
}

pub fn is_named_for(role: StreamRole, path: &Path) -> bool {
    let name = path.file_name().unwrap().to_string_lossy();
    name.starts_with(&format!("mcp-{}-", role.as_str())) && name.ends_with(".log")
}
