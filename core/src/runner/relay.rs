use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::StreamError;
use crate::util::RingBytes;

use super::sink::LogSink;
use super::types::{RelayReport, StreamRole};

/// Copy of a relayed chunk handed to observers such as the transcript writer.
#[derive(Debug)]
pub struct ChunkTap {
    pub role: StreamRole,
    pub bytes: Vec<u8>,
}

/// Per-relay knobs. `stop` is only meaningful for a source that may never reach EOF
/// (the controller's stdin); `tap` receives a copy of every chunk after it was forwarded
/// and `ring` keeps the most recent bytes.
pub struct RelayOptions {
    pub chunk_size: usize,
    pub stop: Option<watch::Receiver<bool>>,
    pub tap: Option<mpsc::Sender<ChunkTap>>,
    pub ring: Option<Arc<RingBytes>>,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            chunk_size: 16 * 1024,
            stop: None,
            tap: None,
            ring: None,
        }
    }
}

pub fn spawn_relay<R, W>(
    role: StreamRole,
    source: R,
    sink: LogSink,
    destination: W,
    opts: RelayOptions,
) -> JoinHandle<Result<RelayReport, StreamError>>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(relay(role, source, sink, destination, opts))
}

/// Tee `source` into `sink` and `destination` until EOF, a stop request, or an I/O failure.
///
/// Each chunk is logged before it is forwarded. A failing sink stops logging for this
/// stream only; forwarding continues. The sink is closed and `destination` shut down on
/// every exit path, and `destination` is dropped when this returns, which is what closes
/// the child's stdin pipe.
pub async fn relay<R, W>(
    role: StreamRole,
    mut source: R,
    mut sink: LogSink,
    mut destination: W,
    opts: RelayOptions,
) -> Result<RelayReport, StreamError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let RelayOptions {
        chunk_size,
        mut stop,
        tap,
        ring,
    } = opts;

    let mut report = RelayReport::new(role);
    let mut buf = vec![0u8; chunk_size.max(1)];

    let res: Result<(), StreamError> = async {
        loop {
            let n = tokio::select! {
                biased;
                _ = stopped(&mut stop) => {
                    report.stopped = true;
                    return Ok(());
                }
                res = source.read(&mut buf) => res.map_err(|e| StreamError::read(role, e))?,
            };
            if n == 0 {
                return Ok(());
            }
            let chunk = &buf[..n];

            if report.log_error.is_none() {
                match sink.write(chunk).await {
                    Ok(()) => report.bytes_logged += n as u64,
                    Err(e) => {
                        tracing::error!(stream = %role, error = %e, "log sink failed; forwarding continues unlogged");
                        report.log_error = Some(e.to_string());
                        let _ = sink.close().await;
                    }
                }
            }

            destination
                .write_all(chunk)
                .await
                .map_err(|e| StreamError::write(role, e))?;
            destination
                .flush()
                .await
                .map_err(|e| StreamError::write(role, e))?;
            report.bytes_relayed += n as u64;

            if let Some(ring) = ring.as_ref() {
                ring.push(chunk);
            }
            if let Some(tx) = tap.as_ref() {
                let _ = tx
                    .send(ChunkTap {
                        role,
                        bytes: chunk.to_vec(),
                    })
                    .await;
            }
        }
    }
    .await;

    if let Err(e) = sink.close().await {
        if report.log_error.is_none() {
            tracing::error!(stream = %role, error = %e, "closing log sink failed");
            report.log_error = Some(e.to_string());
        }
    }

    // Half-close: for the child's stdin the pipe closes once `destination` drops below.
    if res.is_ok() {
        let _ = destination.shutdown().await;
    }

    tracing::debug!(
        stream = %role,
        relayed = report.bytes_relayed,
        logged = report.bytes_logged,
        stopped = report.stopped,
        ok = res.is_ok(),
        "relay finished"
    );

    res.map(|_| report)
}

async fn stopped(stop: &mut Option<watch::Receiver<bool>>) {
    match stop {
        // A dropped sender counts as a stop request too.
        Some(rx) => {
            let _ = rx.wait_for(|s| *s).await;
        }
        None => std::future::pending::<()>().await,
    }
}
