use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub control: ControlConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to `command-capture-<stamp>.log` under `directory`.
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "stdio_tap_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Directory for the diagnostic log. Empty or unset means the capture log directory.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Upper bound of a single relay read.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Also write the combined, timestamped `mcp-capture-<stamp>.log`.
    #[serde(default)]
    pub transcript: bool,

    /// How long to wait for stdout/stderr EOF after the child exited. Unset waits forever.
    #[serde(default)]
    pub drain_timeout_ms: Option<u64>,

    /// Bytes of child stderr kept for the exit diagnostic.
    #[serde(default = "default_stderr_tail_bytes")]
    pub stderr_tail_bytes: usize,
}

fn default_log_dir() -> String {
    "./logs".to_string()
}

fn default_chunk_size() -> usize {
    16 * 1024
}

fn default_stderr_tail_bytes() -> usize {
    4 * 1024
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            chunk_size: default_chunk_size(),
            transcript: false,
            drain_timeout_ms: None,
            stderr_tail_bytes: default_stderr_tail_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Forward SIGINT/SIGTERM/SIGHUP received by the proxy to the child.
    #[serde(default = "default_forward_signals")]
    pub forward_signals: bool,

    #[serde(default = "default_tap_channel_capacity")]
    pub tap_channel_capacity: usize,
}

fn default_forward_signals() -> bool {
    true
}

fn default_tap_channel_capacity() -> usize {
    1024
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            forward_signals: default_forward_signals(),
            tap_channel_capacity: default_tap_channel_capacity(),
        }
    }
}
