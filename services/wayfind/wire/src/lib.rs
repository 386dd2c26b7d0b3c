//! Wire protocol framing, fixed headers, and CBOR message bodies for wayfind.
//!
//! This crate provides the low-level wire protocol shared by the graph
//! authority, the relay, and the query client: message framing with explicit
//! lengths, a compact fixed header, payload checksums, and the CBOR message
//! structures for topology transfer, route queries, and route replies.
//!
//! ## Wire Format
//!
//! ```text
//! +----------------------+----------------------------+
//! | u32 frame_len        | length of bytes that follow|
//! +----------------------+----------------------------+
//! | Header (12B)         | version, type, flags, code |
//! |                      | and payload CRC32          |
//! +----------------------+----------------------------+
//! | payload              | raw probe bytes, or CBOR   |
//! +----------------------+----------------------------+
//! ```
//!
//! One frame per exchange: `Probe`/`ProbeEcho` for the connectivity
//! handshake, `Graph` for the authority's topology snapshot, `Query` and
//! `Reply` for the client exchange. The reply body is a tagged value, so a
//! one-node route can never collide with the no-route case.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod frame;
pub mod header;
pub mod message;

// Re-export main types
pub use codec::{
    decode_payload, encode_payload, expect_message, request_frame, response_frame, CodecError,
};
pub use error::WireError;
pub use frame::{Frame, FrameDecoder, DEFAULT_MAX_FRAME_SIZE, HARD_MAX_FRAME_SIZE};
pub use header::{
    payload_crc32, Flags, FrameHeader, FrameType, StatusCode, HEADER_SIZE, WIRE_VERSION,
};
pub use message::{EdgeRecord, GraphSnapshot, Node, RouteQuery, RouteReply};
