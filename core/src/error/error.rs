use std::path::PathBuf;

use thiserror::Error;

use crate::runner::StreamRole;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("session failed: {0}")]
    Session(#[from] SessionError),
    #[error("format failed: {0}")]
    Format(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures that end a session before any relay starts.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("log directory {path} is not usable: {source}")]
    LogDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("log sink unavailable: {0}")]
    Sink(#[from] SinkError),
    #[error("spawn of `{command}` failed: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("open {path} failed: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("write to {path} failed: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("sink {path} is closed")]
    Closed { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOp {
    Read,
    Write,
    Join,
}

impl std::fmt::Display for StreamOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StreamOp::Read => "read",
            StreamOp::Write => "write",
            StreamOp::Join => "join",
        })
    }
}

#[derive(Error, Debug)]
#[error("{role} relay {op} failed: {source}")]
pub struct StreamError {
    pub role: StreamRole,
    pub op: StreamOp,
    pub source: std::io::Error,
}

impl StreamError {
    pub fn read(role: StreamRole, source: std::io::Error) -> Self {
        Self {
            role,
            op: StreamOp::Read,
            source,
        }
    }

    pub fn write(role: StreamRole, source: std::io::Error) -> Self {
        Self {
            role,
            op: StreamOp::Write,
            source,
        }
    }

    pub fn join(role: StreamRole, source: std::io::Error) -> Self {
        Self {
            role,
            op: StreamOp::Join,
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("waiting for child failed: {0}")]
    Wait(String),
}
