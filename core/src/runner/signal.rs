//! Turns OS termination signals received by the proxy into [`Signal`] messages for a session.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::types::Signal;

/// Channel the session listens on for termination requests.
pub fn signal_channel() -> (mpsc::Sender<Signal>, mpsc::Receiver<Signal>) {
    mpsc::channel(8)
}

/// Install handlers for SIGINT, SIGTERM and SIGHUP and feed each delivery into `tx`.
///
/// Once installed, the proxy no longer dies from these signals itself; the session
/// forwards them and exits when the child does.
#[cfg(unix)]
pub fn install_os_forwarder(tx: mpsc::Sender<Signal>) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        loop {
            let sig = tokio::select! {
                Some(()) = sigint.recv() => Signal::Interrupt,
                Some(()) = sigterm.recv() => Signal::Terminate,
                Some(()) = sighup.recv() => Signal::Hangup,
                else => break,
            };
            tracing::info!(signal = ?sig, "received signal, forwarding to child");
            if tx.send(sig).await.is_err() {
                break;
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn install_os_forwarder(tx: mpsc::Sender<Signal>) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl+C, forwarding to child");
            if tx.send(Signal::Interrupt).await.is_err() {
                break;
            }
        }
    }))
}
