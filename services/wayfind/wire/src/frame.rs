//! Message framing for the wire protocol.
//!
//! Every exchange on a connection is one frame: an explicit length prefix,
//! the fixed header, and the payload. The decoder accumulates bytes until a
//! complete frame is available and verifies the payload checksum before
//! handing the frame up.

use crate::header::{payload_crc32, FrameHeader, FrameType, StatusCode, HEADER_SIZE};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

/// Maximum frame size accepted by default (1 MiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;
/// Hard maximum frame size limit (16 MiB)
pub const HARD_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Complete wire frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Fixed header (12 bytes)
    pub header: FrameHeader,
    /// Frame payload
    pub payload: Bytes,
}

impl Frame {
    /// Create a request frame, computing the payload checksum
    pub fn new(typ: FrameType, payload: Bytes) -> Self {
        let mut header = FrameHeader::new(typ);
        header.payload_crc = payload_crc32(&payload);
        Self { header, payload }
    }

    /// Create a response frame with the given status code
    pub fn response(typ: FrameType, code: StatusCode, payload: Bytes) -> Self {
        let mut header = FrameHeader::response(typ, code);
        header.payload_crc = payload_crc32(&payload);
        Self { header, payload }
    }

    /// Get the total frame size when encoded
    pub fn encoded_size(&self) -> usize {
        4 + HEADER_SIZE + self.payload.len()
    }

    /// Encode frame to a contiguous buffer
    pub fn encode(&self, max_frame_size: usize) -> Result<Bytes, crate::WireError> {
        let total_size = self.encoded_size();
        if total_size > max_frame_size {
            return Err(crate::WireError::Size(total_size));
        }

        let mut buf = BytesMut::with_capacity(total_size);

        // Frame length (everything after this u32)
        let frame_len = total_size - 4;
        buf.put_u32(frame_len as u32);

        self.header.encode(&mut buf);
        buf.put_slice(&self.payload);

        Ok(buf.freeze())
    }
}

/// Frame decoder for parsing incoming frames
#[derive(Debug)]
pub struct FrameDecoder {
    max_frame_size: usize,
}

impl FrameDecoder {
    /// Create a new frame decoder with the default size limit
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Create a decoder with a custom size limit, clamped to the hard limit
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size: max_frame_size.min(HARD_MAX_FRAME_SIZE),
        }
    }

    /// Decode one frame from a buffer
    ///
    /// Returns `Ok(None)` when the buffer does not yet hold a complete frame.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, crate::WireError> {
        // Need at least 4 bytes for frame length
        if buf.len() < 4 {
            return Ok(None);
        }

        // Peek at frame length
        let frame_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

        if frame_len < HEADER_SIZE {
            return Err(crate::WireError::Malformed);
        }
        if frame_len > self.max_frame_size {
            return Err(crate::WireError::Size(frame_len));
        }

        // Check if we have the complete frame
        if buf.len() < 4 + frame_len {
            return Ok(None);
        }

        // Skip the frame length field
        buf.advance(4);

        let mut frame_buf = buf.split_to(frame_len).freeze();
        let header = FrameHeader::decode(&mut frame_buf)?;

        // Remaining bytes are payload; verify against the header checksum
        let payload = frame_buf;
        if payload_crc32(&payload) != header.payload_crc {
            return Err(crate::WireError::Checksum);
        }

        trace!(
            "Decoded {:?} frame with {} byte payload",
            header.typ,
            payload.len()
        );

        Ok(Some(Frame { header, payload }))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
