//! Graph authority: owns the topology and serves it whole on request.

use anyhow::Context;
use bytes::BytesMut;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};
use wayfind_graph::WeightedGraph;
use wayfind_session::{answer_probe, write_frame, SessionConfig, SessionError};
use wayfind_wire::{response_frame, FrameType, StatusCode};

/// Long-running service owning one immutable [`WeightedGraph`].
///
/// Each accepted connection runs one session: answer the connectivity probe,
/// send the full topology snapshot in a single frame, close. The authority
/// keeps no state between sessions.
pub struct GraphAuthority {
    graph: Arc<WeightedGraph>,
    config: SessionConfig,
}

impl GraphAuthority {
    /// Create an authority around a topology
    pub fn new(graph: WeightedGraph, config: SessionConfig) -> Self {
        Self {
            graph: Arc::new(graph),
            config,
        }
    }

    /// The topology this authority serves
    pub fn graph(&self) -> &WeightedGraph {
        &self.graph
    }

    /// Serve connections on the listener until the task is dropped.
    ///
    /// Per-session failures abort that session only; the loop keeps
    /// accepting.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        let local = listener
            .local_addr()
            .context("authority listener has no local address")?;
        info!(
            "Authority serving {} edges on {}",
            self.graph.edge_count(),
            local
        );

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    info!("Accepted connection from {}", peer);

                    let graph = self.graph.clone();
                    let config = self.config.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_peer(graph, config, stream).await {
                            warn!("Session with {} aborted: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    warn!("Accept error: {}; continuing", e);
                }
            }
        }
    }
}

/// Run one authority session: probe echo, then the graph transfer.
async fn serve_peer(
    graph: Arc<WeightedGraph>,
    config: SessionConfig,
    mut stream: TcpStream,
) -> Result<(), SessionError> {
    let mut decoder = config.decoder();
    let mut buffer = BytesMut::new();

    // Handshake failure means the graph is never sent
    answer_probe(&mut stream, &mut decoder, &mut buffer, &config).await?;

    let snapshot = graph.snapshot();
    let frame = response_frame(FrameType::Graph, StatusCode::Ok, &snapshot)?;
    write_frame(&mut stream, &frame, &config).await?;

    info!("Sent topology snapshot ({} edges)", snapshot.edges.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_session::{connect_tcp, initiate_probe, listen_tcp, read_frame, DEFAULT_PROBE};
    use wayfind_wire::{expect_message, EdgeRecord, Frame, GraphSnapshot};

    fn small_graph() -> WeightedGraph {
        WeightedGraph::from_edges(vec![
            EdgeRecord::new('A', 'D', 1),
            EdgeRecord::new('D', 'B', 2),
        ])
        .unwrap()
    }

    async fn spawn_authority(graph: WeightedGraph) -> std::net::SocketAddr {
        let listener = listen_tcp("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let authority = GraphAuthority::new(graph, SessionConfig::default());
        tokio::spawn(async move { authority.serve(listener).await });
        addr
    }

    async fn fetch_snapshot(addr: std::net::SocketAddr) -> GraphSnapshot {
        let config = SessionConfig::default();
        let mut stream = connect_tcp(addr).await.unwrap();
        let mut decoder = config.decoder();
        let mut buffer = BytesMut::new();

        initiate_probe(&mut stream, DEFAULT_PROBE, &mut decoder, &mut buffer, &config)
            .await
            .unwrap();

        let frame = read_frame(&mut stream, &mut decoder, &mut buffer, &config)
            .await
            .unwrap();
        expect_message(&frame, FrameType::Graph).unwrap()
    }

    #[tokio::test]
    async fn test_probe_then_full_snapshot() {
        let graph = small_graph();
        let addr = spawn_authority(graph.clone()).await;

        let snapshot = fetch_snapshot(addr).await;
        assert_eq!(snapshot, graph.snapshot());
    }

    #[tokio::test]
    async fn test_bad_handshake_gets_no_graph_and_loop_survives() {
        let graph = small_graph();
        let addr = spawn_authority(graph.clone()).await;
        let config = SessionConfig::default();

        // First peer opens with a query instead of a probe
        {
            let mut stream = connect_tcp(addr).await.unwrap();
            let bogus = Frame::new(
                FrameType::Query,
                bytes::Bytes::from_static(b"no probe here"),
            );
            write_frame(&mut stream, &bogus, &config).await.unwrap();

            let mut decoder = config.decoder();
            let mut buffer = BytesMut::new();
            let result = read_frame(&mut stream, &mut decoder, &mut buffer, &config).await;
            assert!(matches!(result, Err(SessionError::Closed)));
        }

        // A well-behaved peer on a fresh connection still gets the graph
        let snapshot = fetch_snapshot(addr).await;
        assert_eq!(snapshot, graph.snapshot());
    }
}
