//! Frame header processing for the wire protocol.
//!
//! This module defines the 12-byte fixed header that precedes every frame
//! payload. The header identifies the exchange a frame belongs to and carries
//! a payload checksum so corrupted transfers are rejected before decoding.

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Wire protocol version
pub const WIRE_VERSION: u8 = 1;

/// Frame header size in bytes
pub const HEADER_SIZE: usize = 12;

/// Frame types as defined in the wire protocol
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameType {
    /// Connectivity probe carrying arbitrary bytes
    Probe = 0x00,
    /// Echo of a probe, byte-identical payload
    ProbeEcho = 0x01,
    /// Full topology transfer from the authority
    Graph = 0x02,
    /// Route query from a client
    Query = 0x03,
    /// Route reply to a client
    Reply = 0x04,
}

impl TryFrom<u8> for FrameType {
    type Error = crate::WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(FrameType::Probe),
            0x01 => Ok(FrameType::ProbeEcho),
            0x02 => Ok(FrameType::Graph),
            0x03 => Ok(FrameType::Query),
            0x04 => Ok(FrameType::Reply),
            _ => Err(crate::WireError::Type(value)),
        }
    }
}

bitflags! {
    /// Frame flags bitmask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Flags: u16 {
        /// Frame answers a request on the same connection
        const RESPONSE = 1 << 0;
    }
}

/// Status codes carried on reply frames
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    /// Success
    Ok = 0,
    /// No route between the queried endpoints
    NoRoute = 1,
    /// Request did not match the protocol shape
    Malformed = 2,
    /// Responder-side failure
    Internal = 3,
}

impl TryFrom<u8> for StatusCode {
    type Error = crate::WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(StatusCode::Ok),
            1 => Ok(StatusCode::NoRoute),
            2 => Ok(StatusCode::Malformed),
            3 => Ok(StatusCode::Internal),
            _ => Err(crate::WireError::Code(value)),
        }
    }
}

/// Fixed frame header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    /// Protocol version (must be 1)
    pub ver: u8,
    /// Frame type
    pub typ: FrameType,
    /// Frame flags
    pub flags: Flags,
    /// Status code, Ok on requests
    pub code: StatusCode,
    /// Reserved field (must be zero)
    pub reserved0: u8,
    /// CRC32 of the payload bytes
    pub payload_crc: u32,
    /// Reserved field (must be zero)
    pub reserved1: u16,
}

impl FrameHeader {
    /// Create a new header for a request frame
    pub fn new(typ: FrameType) -> Self {
        Self {
            ver: WIRE_VERSION,
            typ,
            flags: Flags::empty(),
            code: StatusCode::Ok,
            reserved0: 0,
            payload_crc: 0,
            reserved1: 0,
        }
    }

    /// Create a new header for a response frame
    pub fn response(typ: FrameType, code: StatusCode) -> Self {
        let mut header = Self::new(typ);
        header.flags |= Flags::RESPONSE;
        header.code = code;
        header
    }

    /// Encode the header to bytes (big-endian)
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.ver);
        buf.put_u8(self.typ as u8);
        buf.put_u16(self.flags.bits());
        buf.put_u8(self.code as u8);
        buf.put_u8(self.reserved0);
        buf.put_u32(self.payload_crc);
        buf.put_u16(self.reserved1);
    }

    /// Decode the header from bytes (big-endian)
    pub fn decode(buf: &mut Bytes) -> Result<Self, crate::WireError> {
        if buf.len() < HEADER_SIZE {
            return Err(crate::WireError::Incomplete);
        }

        let ver = buf.get_u8();
        if ver != WIRE_VERSION {
            return Err(crate::WireError::Version(ver));
        }

        let typ = FrameType::try_from(buf.get_u8())?;
        let flags = Flags::from_bits(buf.get_u16()).ok_or(crate::WireError::Reserved)?;
        let code = StatusCode::try_from(buf.get_u8())?;
        let reserved0 = buf.get_u8();
        let payload_crc = buf.get_u32();
        let reserved1 = buf.get_u16();

        if reserved0 != 0 || reserved1 != 0 {
            return Err(crate::WireError::Reserved);
        }

        Ok(Self {
            ver,
            typ,
            flags,
            code,
            reserved0,
            payload_crc,
            reserved1,
        })
    }

    /// Validate the header fields
    pub fn validate(&self) -> Result<(), crate::WireError> {
        if self.ver != WIRE_VERSION {
            return Err(crate::WireError::Version(self.ver));
        }

        if self.reserved0 != 0 || self.reserved1 != 0 {
            return Err(crate::WireError::Reserved);
        }

        Ok(())
    }
}

/// Calculate the CRC32 checksum of a frame payload
pub fn payload_crc32(payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_type_conversion() {
        assert_eq!(FrameType::try_from(0x00).unwrap(), FrameType::Probe);
        assert_eq!(FrameType::try_from(0x04).unwrap(), FrameType::Reply);
        assert!(FrameType::try_from(0xFF).is_err());
    }

    #[test]
    fn test_status_code_conversion() {
        assert_eq!(StatusCode::try_from(0).unwrap(), StatusCode::Ok);
        assert_eq!(StatusCode::try_from(1).unwrap(), StatusCode::NoRoute);
        assert!(StatusCode::try_from(42).is_err());
    }

    #[test]
    fn test_header_encode_decode() {
        let mut header = FrameHeader::new(FrameType::Query);
        header.payload_crc = 0xDEADBEEF;

        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);

        let mut bytes = buf.freeze();
        let decoded = FrameHeader::decode(&mut bytes).unwrap();

        assert_eq!(header, decoded);
    }

    #[test]
    fn test_response_header() {
        let header = FrameHeader::response(FrameType::Reply, StatusCode::NoRoute);
        assert!(header.flags.contains(Flags::RESPONSE));
        assert_eq!(header.code, StatusCode::NoRoute);
    }

    #[test]
    fn test_header_validation() {
        let header = FrameHeader::new(FrameType::Probe);
        assert!(header.validate().is_ok());

        let mut bad_header = header;
        bad_header.ver = 2;
        assert!(bad_header.validate().is_err());

        let mut bad_header = header;
        bad_header.reserved1 = 1;
        assert!(bad_header.validate().is_err());
    }

    #[test]
    fn test_reserved_bits_rejected() {
        let mut buf = BytesMut::new();
        FrameHeader::new(FrameType::Probe).encode(&mut buf);
        buf[5] = 1; // reserved0

        let mut bytes = buf.freeze();
        assert!(matches!(
            FrameHeader::decode(&mut bytes),
            Err(crate::WireError::Reserved)
        ));
    }
}
