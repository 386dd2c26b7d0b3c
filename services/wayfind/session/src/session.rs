//! Per-session configuration, errors, and frame send/recv.
//!
//! Each accepted or dialed connection runs one session: a short
//! request/response exchange after which both sides close. The helpers here
//! read and write whole frames, applying the configured per-operation
//! timeout when one is set. The reference deployment runs without timeouts;
//! leaving `io_timeout` unset reproduces that behavior.

use bytes::BytesMut;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::trace;
use wayfind_wire::{CodecError, Frame, FrameDecoder, FrameType, WireError, DEFAULT_MAX_FRAME_SIZE};

/// Configuration shared by every session a role runs
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Timeout applied to each connect/read/write, none by default
    pub io_timeout: Option<Duration>,
    /// Maximum accepted frame size in bytes
    pub max_frame_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            io_timeout: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl SessionConfig {
    /// Create a decoder honoring this session's frame size limit
    pub fn decoder(&self) -> FrameDecoder {
        FrameDecoder::with_max_frame_size(self.max_frame_size)
    }
}

/// Errors a session can fail with.
///
/// Every variant is recovered at the session boundary: the failing session
/// is aborted and logged, the owning accept loop keeps serving.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Socket-level failure on connect, read, or write
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// The configured per-operation timeout elapsed
    #[error("operation timed out")]
    Timeout,

    /// Peer closed the connection before a complete frame arrived
    #[error("connection closed mid-frame")]
    Closed,

    /// Frame could not be parsed
    #[error("frame error: {0}")]
    Frame(#[from] WireError),

    /// Frame body could not be decoded
    #[error("payload error: {0}")]
    Decode(#[from] CodecError),

    /// A well-formed frame of the wrong type for this point in the exchange
    #[error("unexpected {0:?} frame")]
    UnexpectedFrame(FrameType),

    /// Probe echo did not match the probe that was sent
    #[error("probe echo mismatch")]
    HandshakeMismatch,
}

/// Apply the session timeout to an I/O future when one is configured
pub async fn with_timeout<T, F>(
    io_timeout: Option<Duration>,
    fut: F,
) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    match io_timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| SessionError::Timeout)?,
        None => fut.await,
    }
}

/// Read one complete frame from the stream.
///
/// The decoder and buffer persist across calls on the same connection, so
/// bytes of a following frame read early are not lost.
pub async fn read_frame<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    decoder: &mut FrameDecoder,
    buffer: &mut BytesMut,
    config: &SessionConfig,
) -> Result<Frame, SessionError> {
    with_timeout(config.io_timeout, async {
        loop {
            if let Some(frame) = decoder.decode(buffer)? {
                return Ok(frame);
            }

            let bytes_read = reader.read_buf(buffer).await?;
            if bytes_read == 0 {
                return Err(SessionError::Closed);
            }

            trace!(
                "Read {} bytes, buffer now has {} bytes",
                bytes_read,
                buffer.len()
            );
        }
    })
    .await
}

/// Write one frame to the stream and flush it
pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    frame: &Frame,
    config: &SessionConfig,
) -> Result<(), SessionError> {
    let encoded = frame.encode(config.max_frame_size)?;
    with_timeout(config.io_timeout, async {
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        Ok(())
    })
    .await
}
