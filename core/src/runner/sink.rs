use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::SinkError;
use crate::util::SessionStamp;

use super::types::StreamRole;

/// File name of the raw log for one stream of one session.
pub fn log_file_name(role: StreamRole, stamp: &SessionStamp) -> String {
    stamp.file_name(&format!("mcp-{}", role.as_str()))
}

/// Append-only raw log of one stream.
///
/// Every `write` is flushed before it returns, so writes from the same sink land in call order.
pub struct LogSink {
    role: StreamRole,
    path: PathBuf,
    file: Option<File>,
    written: u64,
}

impl LogSink {
    pub async fn open(dir: &Path, role: StreamRole, stamp: &SessionStamp) -> Result<Self, SinkError> {
        Self::open_path(dir.join(log_file_name(role, stamp)), role).await
    }

    pub(crate) async fn open_path(path: PathBuf, role: StreamRole) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            role,
            path,
            file: Some(file),
            written: 0,
        })
    }

    pub fn role(&self) -> StreamRole {
        self.role
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), SinkError> {
        let Some(file) = self.file.as_mut() else {
            return Err(SinkError::Closed {
                path: self.path.clone(),
            });
        };

        let res = async {
            file.write_all(chunk).await?;
            file.flush().await
        }
        .await;

        match res {
            Ok(()) => {
                self.written += chunk.len() as u64;
                Ok(())
            }
            Err(source) => Err(SinkError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub async fn close(&mut self) -> Result<(), SinkError> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.flush().await.map_err(|source| SinkError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stamp() -> SessionStamp {
        SessionStamp::now()
    }

    #[tokio::test]
    async fn appends_in_call_order_and_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let stamp = stamp();
        let mut sink = LogSink::open(dir.path(), StreamRole::Stdout, &stamp)
            .await
            .unwrap();

        sink.write(b"first ").await.unwrap();
        sink.write(b"").await.unwrap();
        sink.write(b"second\n").await.unwrap();
        assert_eq!(sink.bytes_written(), 13);

        sink.close().await.unwrap();
        sink.close().await.unwrap();
        assert!(sink.is_closed());

        let body = std::fs::read(sink.path()).unwrap();
        assert_eq!(body, b"first second\n");
        assert_eq!(
            sink.path().file_name().unwrap().to_string_lossy(),
            format!("mcp-stdout-{stamp}.log")
        );
    }

    #[tokio::test]
    async fn open_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let stamp = stamp();
        std::fs::write(dir.path().join(log_file_name(StreamRole::Stdin, &stamp)), b"stale").unwrap();

        let mut sink = LogSink::open(dir.path(), StreamRole::Stdin, &stamp)
            .await
            .unwrap();
        sink.close().await.unwrap();
        assert!(std::fs::read(sink.path()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = LogSink::open(dir.path(), StreamRole::Stderr, &stamp())
            .await
            .unwrap();
        sink.close().await.unwrap();
        assert!(matches!(
            sink.write(b"late").await,
            Err(SinkError::Closed { .. })
        ));
    }

    #[tokio::test]
    async fn missing_directory_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = LogSink::open(&missing, StreamRole::Stdout, &stamp())
            .await
            .err()
            .expect("open should fail");
        assert!(matches!(err, SinkError::Open { .. }));
    }
}
