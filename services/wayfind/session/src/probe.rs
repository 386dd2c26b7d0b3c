//! Connectivity probe handshake.
//!
//! Immediately after connecting, the initiator sends a probe frame with
//! arbitrary bytes and the responder echoes the exact same bytes back. The
//! exchange carries no semantic payload; it exists so the initiator can
//! confirm the channel round-trips data before relying on it. A responder
//! that answers with anything but the probe bytes fails the handshake.

use crate::session::{read_frame, write_frame, SessionConfig, SessionError};
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;
use wayfind_wire::{Frame, FrameDecoder, FrameType, StatusCode};

/// Probe bytes used when the caller has no reason to pick its own
pub const DEFAULT_PROBE: &[u8] = b"wayfind connectivity probe";

/// Send a probe and verify the echo, as the initiator.
///
/// The decoder and buffer must be the ones used for the rest of the
/// connection, so bytes of a following frame are not dropped.
pub async fn initiate_probe<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    probe: &[u8],
    decoder: &mut FrameDecoder,
    buffer: &mut BytesMut,
    config: &SessionConfig,
) -> Result<(), SessionError> {
    let frame = Frame::new(FrameType::Probe, Bytes::copy_from_slice(probe));
    write_frame(stream, &frame, config).await?;

    let echo = read_frame(stream, decoder, buffer, config).await?;
    if echo.header.typ != FrameType::ProbeEcho {
        return Err(SessionError::UnexpectedFrame(echo.header.typ));
    }
    if echo.payload != probe {
        return Err(SessionError::HandshakeMismatch);
    }

    debug!("Probe handshake completed ({} byte probe)", probe.len());
    Ok(())
}

/// Answer one probe, as the responder: read it and echo its exact bytes.
pub async fn answer_probe<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    decoder: &mut FrameDecoder,
    buffer: &mut BytesMut,
    config: &SessionConfig,
) -> Result<(), SessionError> {
    let probe = read_frame(stream, decoder, buffer, config).await?;
    if probe.header.typ != FrameType::Probe {
        return Err(SessionError::UnexpectedFrame(probe.header.typ));
    }

    let echo = Frame::response(FrameType::ProbeEcho, StatusCode::Ok, probe.payload.clone());
    write_frame(stream, &echo, config).await?;

    debug!("Echoed {} byte probe", probe.payload.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_echo_roundtrip() {
        let config = SessionConfig::default();
        let (mut initiator, mut responder) = tokio::io::duplex(1024);

        let responder_config = config.clone();
        let responder_task = tokio::spawn(async move {
            let mut decoder = responder_config.decoder();
            let mut buffer = BytesMut::new();
            answer_probe(&mut responder, &mut decoder, &mut buffer, &responder_config).await
        });

        let mut decoder = config.decoder();
        let mut buffer = BytesMut::new();
        initiate_probe(
            &mut initiator,
            DEFAULT_PROBE,
            &mut decoder,
            &mut buffer,
            &config,
        )
        .await
        .unwrap();

        responder_task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_tampered_echo_fails_handshake() {
        let config = SessionConfig::default();
        let (mut initiator, mut responder) = tokio::io::duplex(1024);

        let responder_config = config.clone();
        let responder_task = tokio::spawn(async move {
            let mut decoder = responder_config.decoder();
            let mut buffer = BytesMut::new();
            let probe = read_frame(&mut responder, &mut decoder, &mut buffer, &responder_config)
                .await
                .unwrap();
            assert_eq!(probe.header.typ, FrameType::Probe);

            // Echo different bytes than the probe carried
            let bad_echo = Frame::response(
                FrameType::ProbeEcho,
                StatusCode::Ok,
                Bytes::from_static(b"tampered"),
            );
            write_frame(&mut responder, &bad_echo, &responder_config)
                .await
                .unwrap();
        });

        let mut decoder = config.decoder();
        let mut buffer = BytesMut::new();
        let result = initiate_probe(
            &mut initiator,
            DEFAULT_PROBE,
            &mut decoder,
            &mut buffer,
            &config,
        )
        .await;

        assert!(matches!(result, Err(SessionError::HandshakeMismatch)));
        responder_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_responder_rejects_non_probe_frame() {
        let config = SessionConfig::default();
        let (mut initiator, mut responder) = tokio::io::duplex(1024);

        let initiator_config = config.clone();
        tokio::spawn(async move {
            let frame = Frame::new(FrameType::Query, Bytes::from_static(b"not a probe"));
            let _ = write_frame(&mut initiator, &frame, &initiator_config).await;
        });

        let mut decoder = config.decoder();
        let mut buffer = BytesMut::new();
        let result = answer_probe(&mut responder, &mut decoder, &mut buffer, &config).await;
        assert!(matches!(
            result,
            Err(SessionError::UnexpectedFrame(FrameType::Query))
        ));
    }
}
