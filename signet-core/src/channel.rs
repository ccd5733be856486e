//! Newline-framed transport over a pair of async byte streams.
//!
//! The reading half runs in its own task and hands each complete line to the
//! consumer through a channel of capacity 1, so at most one line is waiting
//! while the previous one is being handled. Writes go straight to the output
//! stream and are flushed per message.

use std::io;

use thiserror::Error;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::codec::CodecError;

/// Longest accepted line, newline excluded.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Fatal failure of the channel to the peer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading from or writing to the peer failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    /// The peer sent more than `limit` bytes without a newline.
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    /// A reply could not be serialized.
    #[error(transparent)]
    Encode(#[from] CodecError),
}

/// Line-oriented channel to the peer process.
pub struct LineChannel<W> {
    incoming: mpsc::Receiver<Result<String, TransportError>>,
    writer: W,
    reader_task: JoinHandle<()>,
}

impl<W> LineChannel<W>
where
    W: AsyncWrite + Unpin,
{
    /// Create a channel reading from `reader` and writing to `writer`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<R>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::with_max_line(reader, writer, MAX_LINE_BYTES)
    }

    /// Like [`new`](Self::new) with a custom line length limit.
    pub fn with_max_line<R>(reader: R, writer: W, max_line: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, incoming) = mpsc::channel(1);
        let reader_task = tokio::spawn(read_lines(BufReader::new(reader), max_line, tx));

        Self {
            incoming,
            writer,
            reader_task,
        }
    }

    /// Wait for the next line.
    ///
    /// Returns `Ok(None)` once the input stream is closed. The trailing
    /// newline (and a preceding carriage return) is stripped.
    ///
    /// # Errors
    ///
    /// [`TransportError::Io`] on a read failure and
    /// [`TransportError::LineTooLong`] when a line exceeds the limit. The
    /// channel yields nothing more after an error.
    pub async fn receive(&mut self) -> Result<Option<String>, TransportError> {
        self.incoming.recv().await.transpose()
    }

    /// Write `line` followed by a newline and flush.
    pub async fn send(&mut self, line: &str) -> Result<(), TransportError> {
        debug_assert!(!line.contains('\n'), "framed message contains a newline");

        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

impl<W> Drop for LineChannel<W> {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

async fn read_lines<R>(
    mut reader: R,
    max_line: usize,
    tx: mpsc::Sender<Result<String, TransportError>>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    // One extra byte for the newline.
    let window = u64::try_from(max_line).unwrap_or(u64::MAX).saturating_add(1);

    loop {
        buf.clear();
        match (&mut reader).take(window).read_until(b'\n', &mut buf).await {
            Ok(0) => {
                debug!("peer closed its output stream");
                break;
            }
            Ok(n) if n > max_line && !buf.ends_with(b"\n") => {
                warn!(limit = max_line, "peer sent an oversized line");
                let _ = tx.send(Err(TransportError::LineTooLong { limit: max_line })).await;
                break;
            }
            Ok(n) => {
                trace!(bytes = n, "read line from peer");
                let line = String::from_utf8_lossy(strip_line_ending(&buf)).into_owned();
                if tx.send(Ok(line)).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e.into())).await;
                break;
            }
        }
    }
}

fn strip_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
