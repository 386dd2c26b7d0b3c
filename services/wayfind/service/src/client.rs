//! One-shot query client.

use anyhow::Context;
use bytes::BytesMut;
use std::net::SocketAddr;
use tracing::debug;
use wayfind_session::{
    connect_tcp, read_frame, with_timeout, write_frame, SessionConfig, SessionError,
};
use wayfind_wire::{expect_message, request_frame, FrameType, Node, RouteQuery, RouteReply};

/// Sends one route query to a relay and decodes the reply.
///
/// No retry and no reconnect: a relay that closes the connection without
/// replying surfaces as an error for the caller to report.
pub struct QueryClient {
    relay_addr: SocketAddr,
    config: SessionConfig,
}

impl QueryClient {
    /// Create a client for the relay at the given address
    pub fn new(relay_addr: SocketAddr, config: SessionConfig) -> Self {
        Self { relay_addr, config }
    }

    /// Send one query and wait for the reply
    pub async fn query(
        &self,
        source: impl Into<Node>,
        destination: impl Into<Node>,
    ) -> anyhow::Result<RouteReply> {
        let query = RouteQuery::new(source, destination);

        let mut stream = with_timeout(self.config.io_timeout, async {
            Ok(connect_tcp(self.relay_addr).await?)
        })
        .await
        .with_context(|| format!("connecting to relay at {}", self.relay_addr))?;

        let frame = request_frame(FrameType::Query, &query)?;
        write_frame(&mut stream, &frame, &self.config)
            .await
            .context("sending query")?;

        debug!("Sent query {} -> {}", query.source, query.destination);

        let mut decoder = self.config.decoder();
        let mut buffer = BytesMut::new();
        let reply_frame = read_frame(&mut stream, &mut decoder, &mut buffer, &self.config)
            .await
            .map_err(|e| match e {
                SessionError::Closed => {
                    anyhow::anyhow!("relay closed the connection without a reply")
                }
                other => other.into(),
            })?;

        let reply: RouteReply = expect_message(&reply_frame, FrameType::Reply)?;
        Ok(reply)
    }
}

/// Render a found route as an arrow-joined sequence, e.g. `B -> D -> A`
pub fn render_route(hops: &[Node]) -> String {
    hops.iter()
        .map(Node::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
