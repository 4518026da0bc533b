use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::StartupError;

use super::types::{ExitStatus, LaunchSpec, Signal};

#[async_trait]
pub trait ChildSession: Send {
    fn id(&self) -> Option<u32>;
    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>>;
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()>;
    async fn wait(&mut self) -> anyhow::Result<ExitStatus>;
}

#[async_trait]
pub trait Launcher: Send + Sync {
    fn name(&self) -> &str;
    async fn spawn(&self, spec: &LaunchSpec) -> Result<Box<dyn ChildSession>, StartupError>;
}
