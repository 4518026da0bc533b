use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};

use crate::error::StartupError;

use super::exit;
use super::traits::{ChildSession, Launcher};
use super::types::{ExitStatus, LaunchSpec, Signal};

/// Starts children as local processes with all three stdio streams piped.
pub struct ProcessLauncher {}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    fn name(&self) -> &str {
        "process"
    }

    async fn spawn(&self, spec: &LaunchSpec) -> Result<Box<dyn ChildSession>, StartupError> {
        Ok(Box::new(spawn(spec)?))
    }
}

pub fn spawn(spec: &LaunchSpec) -> Result<ChildHandle, StartupError> {
    let child = Command::new(&spec.cmd)
        .args(&spec.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(false)
        .spawn()
        .map_err(|source| StartupError::Spawn {
            command: spec.cmd.clone(),
            source,
        })?;

    tracing::debug!(pid = ?child.id(), cmd = %spec.cmd, "child spawned");
    Ok(ChildHandle { child })
}

/// Owns the spawned child and, until they are taken, its three pipe ends.
pub struct ChildHandle {
    child: Child,
}

#[async_trait]
impl ChildSession for ChildHandle {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>> {
        self.child
            .stdin
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncWrite + Unpin + Send>)
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    #[cfg(unix)]
    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()> {
        // Already reaped: nothing left to signal.
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let pid = i32::try_from(pid)?;
        // SAFETY: pid comes from our own un-reaped Child, so it cannot name a recycled process.
        #[allow(unsafe_code)]
        let ret = unsafe { libc::kill(pid, signal.as_raw()) };
        if ret != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(())
    }

    #[cfg(not(unix))]
    async fn signal(&mut self, _signal: Signal) -> anyhow::Result<()> {
        self.child.start_kill()?;
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<ExitStatus> {
        let status = self.child.wait().await?;
        Ok(exit::from_std(status))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn missing_executable_is_a_spawn_error() {
        let spec = LaunchSpec::new("/definitely/not/here/stdio-tap-missing", vec![]);
        let err = match spawn(&spec) {
            Ok(_) => panic!("spawn should fail"),
            Err(e) => e,
        };
        match err {
            StartupError::Spawn { command, source } => {
                assert_eq!(command, "/definitely/not/here/stdio-tap-missing");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn pipes_are_taken_once_and_status_is_reported() {
        let spec = LaunchSpec::new("sh", vec!["-c".into(), "printf hi; exit 4".into()]);
        let mut child = spawn(&spec).unwrap();

        let mut out = child.stdout().expect("stdout pipe");
        assert!(child.stdout().is_none());
        drop(child.stdin());

        let mut buf = String::new();
        out.read_to_string(&mut buf).await.unwrap();
        assert_eq!(buf, "hi");
        assert_eq!(child.wait().await.unwrap(), ExitStatus::Code(4));
    }

    #[tokio::test]
    async fn signal_reaches_the_child() {
        let spec = LaunchSpec::new("sleep", vec!["30".into()]);
        let mut child = spawn(&spec).unwrap();
        child.signal(Signal::Terminate).await.unwrap();
        assert_eq!(
            child.wait().await.unwrap(),
            ExitStatus::Signaled(libc::SIGTERM)
        );
    }
}
