use crate::error::StreamError;

/// One of the three relayed stdio streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamRole {
    Stdin,
    Stdout,
    Stderr,
}

impl StreamRole {
    pub const ALL: [StreamRole; 3] = [StreamRole::Stdin, StreamRole::Stdout, StreamRole::Stderr];

    pub fn as_str(self) -> &'static str {
        match self {
            StreamRole::Stdin => "stdin",
            StreamRole::Stdout => "stdout",
            StreamRole::Stderr => "stderr",
        }
    }

    /// Tag used in the combined transcript.
    pub fn transcript_tag(self) -> &'static str {
        match self {
            StreamRole::Stdin => "IN",
            StreamRole::Stdout => "OUT",
            StreamRole::Stderr => "ERR",
        }
    }
}

impl std::fmt::Display for StreamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Termination request delivered to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
    Hangup,
    Kill,
}

impl Signal {
    #[cfg(unix)]
    pub fn as_raw(self) -> i32 {
        match self {
            Signal::Interrupt => libc::SIGINT,
            Signal::Terminate => libc::SIGTERM,
            Signal::Hangup => libc::SIGHUP,
            Signal::Kill => libc::SIGKILL,
        }
    }
}

/// How the child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Code(i32),
    Signaled(i32),
    Unknown,
}

#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub cmd: String,
    pub args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(cmd: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            cmd: cmd.into(),
            args,
        }
    }
}

#[derive(Debug)]
pub struct RelayReport {
    pub role: StreamRole,
    /// Bytes written to the destination.
    pub bytes_relayed: u64,
    /// Bytes appended to the log sink.
    pub bytes_logged: u64,
    /// Set when logging stopped early; forwarding carried on without it.
    pub log_error: Option<String>,
    /// True when the stdin relay was told to stop instead of reaching EOF.
    pub stopped: bool,
}

impl RelayReport {
    pub fn new(role: StreamRole) -> Self {
        Self {
            role,
            bytes_relayed: 0,
            bytes_logged: 0,
            log_error: None,
            stopped: false,
        }
    }
}

#[derive(Debug)]
pub struct SessionReport {
    pub session_id: String,
    pub status: ExitStatus,
    pub exit_code: i32,
    pub relays: Vec<RelayReport>,
    pub stream_errors: Vec<StreamError>,
    pub stderr_tail: String,
    pub duration_ms: u64,
}

impl SessionReport {
    pub fn relay(&self, role: StreamRole) -> Option<&RelayReport> {
        self.relays.iter().find(|r| r.role == role)
    }
}
