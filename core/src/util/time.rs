use chrono::{DateTime, Local};

/// Start time of a session, rendered into every file name the session creates.
///
/// The rendered form is `YYYYmmdd-HHMMSS-mmm-<pid>`; the millisecond and pid parts keep
/// concurrent sessions sharing one directory from colliding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStamp {
    started_at: DateTime<Local>,
    pid: u32,
}

impl SessionStamp {
    pub fn now() -> Self {
        Self::at(Local::now(), std::process::id())
    }

    pub fn at(started_at: DateTime<Local>, pid: u32) -> Self {
        Self { started_at, pid }
    }

    pub fn file_name(&self, prefix: &str) -> String {
        format!("{prefix}-{self}.log")
    }
}

impl std::fmt::Display for SessionStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.started_at.format("%Y%m%d-%H%M%S-%3f"),
            self.pid
        )
    }
}

/// Wall-clock prefix used by transcript lines: `2024-05-01 12:00:00.123`.
pub fn transcript_timestamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}
