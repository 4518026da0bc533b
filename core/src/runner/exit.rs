use super::types::ExitStatus;

/// Reserved exit code when the child could not be started at all.
///
/// Same value `env`, `nohup` and `timeout` use for a command they could not run, so a
/// wrapped shell reporting "command not found" (`sh -c missing`) also exits 127. Only
/// the stderr diagnostic tells the two apart.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;
/// Reserved exit code for the proxy's own failures (config, log directory, wait).
pub const PROXY_FAILURE_EXIT_CODE: i32 = 125;

pub fn from_std(status: std::process::ExitStatus) -> ExitStatus {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(code) = status.code() {
            ExitStatus::Code(code)
        } else if let Some(sig) = status.signal() {
            ExitStatus::Signaled(sig)
        } else {
            ExitStatus::Unknown
        }
    }
    #[cfg(not(unix))]
    {
        status.code().map(ExitStatus::Code).unwrap_or(ExitStatus::Unknown)
    }
}

/// Map a child's status to the proxy's own exit code: plain codes pass through,
/// signal deaths become `128 + signal`.
pub fn normalize_exit(status: ExitStatus) -> i32 {
    match status {
        ExitStatus::Code(code) => code,
        ExitStatus::Signaled(sig) => 128 + sig,
        ExitStatus::Unknown => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_pass_through_and_signals_are_offset() {
        assert_eq!(normalize_exit(ExitStatus::Code(0)), 0);
        assert_eq!(normalize_exit(ExitStatus::Code(255)), 255);
        assert_eq!(normalize_exit(ExitStatus::Signaled(15)), 143);
        assert_eq!(normalize_exit(ExitStatus::Signaled(9)), 137);
        assert_eq!(normalize_exit(ExitStatus::Unknown), 1);
    }

    #[cfg(unix)]
    #[test]
    fn reads_raw_wait_status() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(
            from_std(std::process::ExitStatus::from_raw(3 << 8)),
            ExitStatus::Code(3)
        );
        assert_eq!(
            from_std(std::process::ExitStatus::from_raw(libc::SIGTERM)),
            ExitStatus::Signaled(libc::SIGTERM)
        );
    }
}
