use tokio::sync::mpsc;

use crate::error::SessionError;

use super::session::{ControllerIo, ProxySession, SessionConfig};
use super::traits::Launcher;
use super::types::{SessionReport, Signal};

pub struct RunSessionArgs<'a> {
    pub config: SessionConfig,
    pub launcher: &'a dyn Launcher,
    pub io: ControllerIo,
    pub signals: mpsc::Receiver<Signal>,
}

pub async fn run_session(args: RunSessionArgs<'_>) -> Result<SessionReport, SessionError> {
    let session = ProxySession::start(args.config, args.launcher).await?;
    for path in session.log_paths() {
        tracing::debug!(session_id = %session.id(), path = %path.display(), "stream log opened");
    }
    session.run(args.io, args.signals).await
}
