//! Length-prefixed message framing over a byte stream.
//!
//! A frame is a 4-byte big-endian unsigned length followed by exactly that
//! many payload bytes. This layer knows nothing about JSON.
//!
//! Replies go through [`ReplyWriter`], which makes the protocol's one
//! irregularity explicit: event acks (`OK`) and parse errors (`ERR`) are
//! raw unframed bytes, while query/action responses are framed JSON.

use codepet_protocol::{ACK, ERR, MAX_FRAME_LEN};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum FrameError {
    /// The peer claimed a payload larger than [`MAX_FRAME_LEN`]. The
    /// claimed payload is never read.
    #[error("frame of {len} bytes exceeds the 1 MiB limit")]
    Oversize { len: usize },
    #[error("stream closed mid-frame")]
    Truncated,
    #[error("failed encoding framed response: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write one frame: 4-byte big-endian length, then the payload, flushed.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_LEN {
        return Err(FrameError::Oversize {
            len: payload.len(),
        });
    }
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. Returns `None` on a clean close with zero bytes
/// available; a close mid-frame is [`FrameError::Truncated`].
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0u8; 4];
    let mut filled = 0;
    while filled < len_bytes.len() {
        let n = reader.read(&mut len_bytes[filled..]).await?;
        if n == 0 {
            return if filled == 0 {
                Ok(None)
            } else {
                Err(FrameError::Truncated)
            };
        }
        filled += n;
    }

    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::Oversize { len });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|error| {
        if error.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameError::Truncated
        } else {
            FrameError::Io(error)
        }
    })?;
    Ok(Some(payload))
}

/// Writes exactly one reply, in whichever of the two reply shapes the
/// request calls for.
pub struct ReplyWriter<W> {
    writer: W,
}

impl<W> ReplyWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// The raw 2-byte `OK` event acknowledgment. No length prefix.
    pub async fn write_ack(&mut self) -> Result<(), FrameError> {
        self.writer.write_all(ACK).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// The raw 3-byte `ERR` parse-failure reply. No length prefix.
    pub async fn write_err(&mut self) -> Result<(), FrameError> {
        self.writer.write_all(ERR).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// A framed JSON response, for QUERY/ACTION results.
    pub async fn write_framed(&mut self, value: &serde_json::Value) -> Result<(), FrameError> {
        let payload = serde_json::to_vec(value)?;
        write_frame(&mut self.writer, &payload).await
    }
}
