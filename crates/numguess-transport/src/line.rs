//! Newline-delimited framing over any async byte stream.
//!
//! Each message is one line terminated by `\n`. The reader keeps
//! accumulating until it sees the terminator, so a message split across
//! several TCP segments is reassembled and several messages delivered in
//! one segment are handed out one at a time.

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
    BufReader, ReadHalf, WriteHalf,
};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, TransportError};

/// Longest accepted line, excluding the terminator.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// A [`Connection`] that frames messages as lines over a byte stream.
///
/// The read and write halves sit behind separate locks, so a writer task
/// can push outbound frames while the owning session is parked in
/// [`recv`](Connection::recv).
pub struct LineConnection<S> {
    id: ConnectionId,
    reader: Mutex<BufReader<ReadHalf<S>>>,
    writer: Mutex<WriteHalf<S>>,
}

impl<S> LineConnection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wraps a stream with a freshly allocated connection ID.
    pub fn new(stream: S) -> Self {
        Self::with_id(ConnectionId::next(), stream)
    }

    /// Wraps a stream under an existing connection ID.
    pub fn with_id(id: ConnectionId, stream: S) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            id,
            reader: Mutex::new(BufReader::new(read_half)),
            writer: Mutex::new(write_half),
        }
    }

    async fn read_frame(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut reader = self.reader.lock().await;
        loop {
            let mut line = Vec::new();
            let limit = (MAX_FRAME_LEN + 1) as u64;
            let n = (&mut *reader)
                .take(limit)
                .read_until(b'\n', &mut line)
                .await
                .map_err(TransportError::ReceiveFailed)?;
            if n == 0 {
                return Ok(None);
            }

            let terminated = line.last() == Some(&b'\n');
            if terminated {
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
            } else if line.len() > MAX_FRAME_LEN {
                return Err(TransportError::FrameTooLarge {
                    limit: MAX_FRAME_LEN,
                });
            }

            if line.iter().all(u8::is_ascii_whitespace) {
                if terminated {
                    continue;
                }
                return Ok(None);
            }
            return Ok(Some(line));
        }
    }
}

impl<S> Connection for LineConnection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if data.contains(&b'\n') {
            return Err(TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "frame contains a line terminator",
            )));
        }
        let mut writer = self.writer.lock().await;
        writer
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)?;
        writer
            .write_all(b"\n")
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        self.read_frame().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
