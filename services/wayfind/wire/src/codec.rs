//! Encoding and decoding of frame payloads.
//!
//! Structured frame bodies are canonical CBOR. The helpers here bridge
//! between serde message types and the raw payload bytes carried by a
//! [`Frame`](crate::Frame).

use crate::frame::Frame;
use crate::header::{FrameType, StatusCode};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Payload codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// Message could not be encoded to CBOR
    #[error("cbor encode failed")]
    Encode,

    /// Payload could not be decoded as the expected message
    #[error("cbor decode failed")]
    Decode,

    /// Frame carried an unexpected type for the exchange
    #[error("unexpected frame type {0:?}")]
    UnexpectedType(FrameType),
}

/// Encode a message as CBOR payload bytes
pub fn encode_payload<T: Serialize>(message: &T) -> Result<Bytes, CodecError> {
    let mut buf = Vec::new();
    ciborium::into_writer(message, &mut buf).map_err(|_| CodecError::Encode)?;
    Ok(Bytes::from(buf))
}

/// Decode CBOR payload bytes into a message
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T, CodecError> {
    ciborium::from_reader(payload).map_err(|_| CodecError::Decode)
}

/// Build a request frame around a CBOR message
pub fn request_frame<T: Serialize>(typ: FrameType, message: &T) -> Result<Frame, CodecError> {
    Ok(Frame::new(typ, encode_payload(message)?))
}

/// Build a response frame around a CBOR message
pub fn response_frame<T: Serialize>(
    typ: FrameType,
    code: StatusCode,
    message: &T,
) -> Result<Frame, CodecError> {
    Ok(Frame::response(typ, code, encode_payload(message)?))
}

/// Decode the body of a frame after checking its type
pub fn expect_message<T: DeserializeOwned>(
    frame: &Frame,
    typ: FrameType,
) -> Result<T, CodecError> {
    if frame.header.typ != typ {
        return Err(CodecError::UnexpectedType(frame.header.typ));
    }
    decode_payload(&frame.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{EdgeRecord, GraphSnapshot, Node, RouteQuery, RouteReply};

    #[test]
    fn test_query_payload_roundtrip() {
        let query = RouteQuery::new('B', 'A');
        let payload = encode_payload(&query).unwrap();
        let decoded: RouteQuery = decode_payload(&payload).unwrap();
        assert_eq!(decoded, query);
    }

    #[test]
    fn test_snapshot_payload_roundtrip() {
        let snapshot = GraphSnapshot::new(vec![
            EdgeRecord::new('A', 'D', 1),
            EdgeRecord::new('D', 'B', 2),
        ]);
        let payload = encode_payload(&snapshot).unwrap();
        let decoded: GraphSnapshot = decode_payload(&payload).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_reply_variants_stay_distinct() {
        let found = RouteReply::Found {
            hops: vec![Node::from('A')],
        };
        let found_bytes = encode_payload(&found).unwrap();
        let no_route_bytes = encode_payload(&RouteReply::NoRoute).unwrap();
        assert_ne!(found_bytes, no_route_bytes);

        let decoded: RouteReply = decode_payload(&found_bytes).unwrap();
        assert!(decoded.is_found());
    }

    #[test]
    fn test_expect_message_checks_type() {
        let frame = request_frame(FrameType::Query, &RouteQuery::new('A', 'C')).unwrap();

        let decoded: RouteQuery = expect_message(&frame, FrameType::Query).unwrap();
        assert_eq!(decoded.source, Node::from('A'));

        let wrong: Result<GraphSnapshot, _> = expect_message(&frame, FrameType::Graph);
        assert!(matches!(wrong, Err(CodecError::UnexpectedType(_))));
    }

    #[test]
    fn test_garbage_payload_rejected() {
        let result: Result<RouteQuery, _> = decode_payload(b"not cbor at all");
        assert!(matches!(result, Err(CodecError::Decode)));
    }
}
