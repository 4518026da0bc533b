use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::runner::{ChunkTap, StreamRole};
use crate::util::time::transcript_timestamp;
use crate::util::SessionStamp;

pub fn transcript_path(dir: &Path, stamp: &SessionStamp) -> PathBuf {
    dir.join(stamp.file_name("mcp-capture"))
}

pub async fn open_transcript(path: &Path) -> std::io::Result<tokio::fs::File> {
    tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
}

/// Consume relay taps and write one `[ts] IN|OUT|ERR: line` entry per complete line.
///
/// Lines are split per stream, so interleaved stdout/stderr chunks never merge into one
/// entry. Partial lines still buffered when the channel closes are flushed last, in
/// stdin, stdout, stderr order. Resolves to the number of entries written.
pub fn spawn_transcript_writer<W>(
    out: W,
    rx: mpsc::Receiver<ChunkTap>,
) -> JoinHandle<std::io::Result<u64>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(write_transcript(out, rx))
}

async fn write_transcript<W>(mut out: W, mut rx: mpsc::Receiver<ChunkTap>) -> std::io::Result<u64>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut pending: HashMap<StreamRole, Vec<u8>> = HashMap::new();
    let mut entries = 0u64;

    while let Some(tap) = rx.recv().await {
        let line_buf = pending.entry(tap.role).or_default();
        line_buf.extend_from_slice(&tap.bytes);

        while let Some(pos) = line_buf.iter().position(|&b| b == b'\n') {
            let mut one = line_buf.drain(..=pos).collect::<Vec<u8>>();
            trim_newline(&mut one);
            write_entry(&mut out, tap.role, &one).await?;
            entries += 1;
        }
    }

    for role in StreamRole::ALL {
        if let Some(mut rest) = pending.remove(&role) {
            trim_newline(&mut rest);
            if !rest.is_empty() {
                write_entry(&mut out, role, &rest).await?;
                entries += 1;
            }
        }
    }

    out.flush().await?;
    Ok(entries)
}

async fn write_entry<W>(out: &mut W, role: StreamRole, line: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let entry = format!(
        "[{}] {}: {}\n",
        transcript_timestamp(chrono::Local::now()),
        role.transcript_tag(),
        String::from_utf8_lossy(line)
    );
    out.write_all(entry.as_bytes()).await
}

fn trim_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}
