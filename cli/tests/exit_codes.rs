#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;

/// Run the proxy with an isolated home and working directory so no user config leaks in.
fn stdio_tap(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stdio-tap"))
        .args(args)
        .current_dir(home)
        .env("HOME", home)
        .env_remove("STDIO_TAP_LOG_DIR")
        .env_remove("STDIO_TAP_LOG_LEVEL")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("stdio-tap runs")
}

fn stream_logs(dir: &Path, role: &str) -> Vec<PathBuf> {
    let prefix = format!("mcp-{role}-");
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with(&prefix))
                .unwrap_or(false)
        })
        .collect()
}

fn assert_no_panic(out: &Output) {
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(!stderr.contains("panicked"), "{stderr}");
}

#[test]
fn echo_output_is_relayed_and_logged() {
    let home = tempfile::tempdir().unwrap();
    let logs = home.path().join("logs");

    let out = stdio_tap(
        home.path(),
        &["--quiet", "--log-dir", logs.to_str().unwrap(), "echo", "hello"],
    );

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(out.stdout, b"hello\n");

    let stdout_logs = stream_logs(&logs, "stdout");
    assert_eq!(stdout_logs.len(), 1);
    assert_eq!(std::fs::read(&stdout_logs[0]).unwrap(), b"hello\n");
    assert_eq!(stream_logs(&logs, "stdin").len(), 1);
    assert_eq!(stream_logs(&logs, "stderr").len(), 1);
}

#[test]
fn child_exit_code_becomes_the_proxy_exit_code() {
    let home = tempfile::tempdir().unwrap();
    let logs = home.path().join("logs");

    let out = stdio_tap(
        home.path(),
        &["--quiet", "--log-dir", logs.to_str().unwrap(), "sh", "-c", "exit 7"],
    );

    assert_eq!(out.status.code(), Some(7));
}

#[test]
fn missing_executable_exits_127_without_stream_logs() {
    let home = tempfile::tempdir().unwrap();
    let logs = home.path().join("logs");

    let out = stdio_tap(
        home.path(),
        &["--log-dir", logs.to_str().unwrap(), "stdio-tap-no-such-binary"],
    );

    assert_eq!(out.status.code(), Some(127));
    assert_no_panic(&out);
    for role in ["stdin", "stdout", "stderr"] {
        assert!(stream_logs(&logs, role).is_empty(), "{role} log left behind");
    }
}

#[test]
fn unwritable_log_dir_exits_125_with_a_diagnostic() {
    let home = tempfile::tempdir().unwrap();
    let blocker = home.path().join("blocker");
    std::fs::write(&blocker, b"file, not a directory").unwrap();
    let logs = blocker.join("logs");
    let marker = home.path().join("spawned");

    let out = stdio_tap(
        home.path(),
        &[
            "--log-dir",
            logs.to_str().unwrap(),
            "touch",
            marker.to_str().unwrap(),
        ],
    );

    assert_eq!(out.status.code(), Some(125));
    assert_no_panic(&out);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("log"), "{stderr}");
    assert!(!marker.exists());
}

#[test]
fn unwritable_log_dir_exits_125_even_when_quiet() {
    let home = tempfile::tempdir().unwrap();
    let blocker = home.path().join("blocker");
    std::fs::write(&blocker, b"file, not a directory").unwrap();

    let out = stdio_tap(
        home.path(),
        &[
            "--quiet",
            "--log-dir",
            blocker.join("logs").to_str().unwrap(),
            "echo",
            "hi",
        ],
    );

    assert_eq!(out.status.code(), Some(125));
    assert_no_panic(&out);
    assert!(out.stdout.is_empty());
}
