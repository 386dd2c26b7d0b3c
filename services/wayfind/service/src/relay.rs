//! Relay service: bridges one client query to one authority fetch and back.

use anyhow::Context;
use async_trait::async_trait;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use wayfind_graph::{compute_path, WeightedGraph};
use wayfind_session::{
    connect_tcp, initiate_probe, read_frame, with_timeout, write_frame, SessionConfig,
    SessionError, DEFAULT_PROBE,
};
use wayfind_wire::{
    decode_payload, response_frame, FrameType, GraphSnapshot, RouteQuery, RouteReply, StatusCode,
};

/// Where the relay gets the topology for a query.
///
/// The production implementation dials the authority; tests substitute a
/// static source. One fetch happens per client session, after the query is
/// parsed and before the reply is written.
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Fetch the current topology
    async fn fetch_graph(&self) -> anyhow::Result<WeightedGraph>;
}

/// Fetches the topology from a graph authority over TCP.
pub struct AuthorityClient {
    authority_addr: SocketAddr,
    config: SessionConfig,
}

impl AuthorityClient {
    /// Create a client for the authority at the given address
    pub fn new(authority_addr: SocketAddr, config: SessionConfig) -> Self {
        Self {
            authority_addr,
            config,
        }
    }
}

#[async_trait]
impl GraphSource for AuthorityClient {
    async fn fetch_graph(&self) -> anyhow::Result<WeightedGraph> {
        let mut stream = with_timeout(self.config.io_timeout, async {
            Ok(connect_tcp(self.authority_addr).await?)
        })
        .await
        .with_context(|| format!("connecting to authority at {}", self.authority_addr))?;

        let mut decoder = self.config.decoder();
        let mut buffer = BytesMut::new();

        initiate_probe(
            &mut stream,
            DEFAULT_PROBE,
            &mut decoder,
            &mut buffer,
            &self.config,
        )
        .await
        .context("authority handshake failed")?;

        let frame = read_frame(&mut stream, &mut decoder, &mut buffer, &self.config)
            .await
            .context("reading topology snapshot")?;
        if frame.header.typ != FrameType::Graph {
            return Err(SessionError::UnexpectedFrame(frame.header.typ))
                .context("expected a topology snapshot");
        }

        let snapshot: GraphSnapshot =
            decode_payload(&frame.payload).context("decoding topology snapshot")?;
        let graph =
            WeightedGraph::from_snapshot(snapshot).context("building topology from snapshot")?;

        debug!(
            "Fetched topology: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

/// Relay session counters
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Queries answered with a found route
    pub queries_served: AtomicU64,
    /// Queries answered with the no-route reply
    pub no_route_replies: AtomicU64,
    /// Sessions abandoned without a reply
    pub sessions_aborted: AtomicU64,
}

/// Long-running service accepting client queries.
///
/// Each accepted connection runs one session in its own task: read one
/// query, fetch the topology through the [`GraphSource`], compute the
/// shortest path, write one reply. Any failure before the reply abandons
/// the session without writing anything; the accept loop keeps serving.
pub struct RelayService {
    source: Arc<dyn GraphSource>,
    config: SessionConfig,
    stats: Arc<RelayStats>,
}

impl RelayService {
    /// Create a relay around a graph source
    pub fn new(source: impl GraphSource + 'static, config: SessionConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
            stats: Arc::new(RelayStats::default()),
        }
    }

    /// Session counters, shared with running sessions
    pub fn stats(&self) -> Arc<RelayStats> {
        self.stats.clone()
    }

    /// Serve client connections on the listener until the task is dropped.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        let local = listener
            .local_addr()
            .context("relay listener has no local address")?;
        info!("Relay serving on {}", local);

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    info!("Accepted client connection from {}", peer);

                    let source = self.source.clone();
                    let config = self.config.clone();
                    let stats = self.stats.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_client(source, config, &stats, stream).await {
                            stats.sessions_aborted.fetch_add(1, Ordering::Relaxed);
                            warn!("Client session with {} abandoned: {:#}", peer, e);
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

/// Run one client session to completion.
///
/// The query is parsed before the authority is contacted, and the authority
/// fetch fully precedes the reply.
async fn serve_client(
    source: Arc<dyn GraphSource>,
    config: SessionConfig,
    stats: &RelayStats,
    mut stream: TcpStream,
) -> anyhow::Result<()> {
    let mut decoder = config.decoder();
    let mut buffer = BytesMut::new();

    let frame = read_frame(&mut stream, &mut decoder, &mut buffer, &config)
        .await
        .context("reading client query")?;
    if frame.header.typ != FrameType::Query {
        return Err(SessionError::UnexpectedFrame(frame.header.typ)).context("expected a query");
    }
    let query: RouteQuery = decode_payload(&frame.payload).context("decoding client query")?;

    debug!("Query: {} -> {}", query.source, query.destination);

    let graph = source.fetch_graph().await?;

    let (reply, code) = match compute_path(&graph, &query.source, &query.destination) {
        Some(route) => {
            stats.queries_served.fetch_add(1, Ordering::Relaxed);
            info!(
                "Route {} -> {}: {} hops, weight {}",
                query.source,
                query.destination,
                route.hops.len(),
                route.total_weight
            );
            (RouteReply::Found { hops: route.hops }, StatusCode::Ok)
        }
        None => {
            stats.no_route_replies.fetch_add(1, Ordering::Relaxed);
            info!("No route {} -> {}", query.source, query.destination);
            (RouteReply::NoRoute, StatusCode::NoRoute)
        }
    };

    let frame = response_frame(FrameType::Reply, code, &reply)?;
    write_frame(&mut stream, &frame, &config)
        .await
        .context("writing reply")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::GraphAuthority;
    use crate::client::QueryClient;
    use std::sync::atomic::Ordering;
    use tokio::io::AsyncWriteExt;
    use wayfind_session::listen_tcp;
    use wayfind_wire::{EdgeRecord, Node};

    fn reference_graph() -> WeightedGraph {
        WeightedGraph::from_edges(vec![
            EdgeRecord::new('A', 'D', 1),
            EdgeRecord::new('A', 'B', 6),
            EdgeRecord::new('D', 'B', 2),
            EdgeRecord::new('D', 'E', 1),
            EdgeRecord::new('E', 'B', 2),
            EdgeRecord::new('E', 'C', 5),
            EdgeRecord::new('B', 'C', 5),
        ])
        .unwrap()
    }

    /// Serves a fixed graph without a network hop
    struct StaticGraphSource(WeightedGraph);

    #[async_trait]
    impl GraphSource for StaticGraphSource {
        async fn fetch_graph(&self) -> anyhow::Result<WeightedGraph> {
            Ok(self.0.clone())
        }
    }

    /// Always fails, as a dead authority would
    struct FailingGraphSource;

    #[async_trait]
    impl GraphSource for FailingGraphSource {
        async fn fetch_graph(&self) -> anyhow::Result<WeightedGraph> {
            anyhow::bail!("authority unreachable")
        }
    }

    async fn spawn_relay(source: impl GraphSource + 'static) -> (SocketAddr, Arc<RelayStats>) {
        let listener = listen_tcp("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let relay = RelayService::new(source, SessionConfig::default());
        let stats = relay.stats();
        tokio::spawn(async move { relay.serve(listener).await });
        (addr, stats)
    }

    fn total_weight(graph: &WeightedGraph, hops: &[Node]) -> u32 {
        hops.windows(2)
            .map(|pair| graph.edge_weight(&pair[0], &pair[1]).unwrap())
            .sum()
    }

    #[tokio::test]
    async fn test_query_against_static_source() {
        let graph = reference_graph();
        let (addr, stats) = spawn_relay(StaticGraphSource(graph.clone())).await;

        let client = QueryClient::new(addr, SessionConfig::default());
        let reply = client.query('B', 'A').await.unwrap();

        let hops = reply.hops().expect("route must be found");
        assert_eq!(hops.first(), Some(&Node::from('B')));
        assert_eq!(hops.last(), Some(&Node::from('A')));
        assert_eq!(total_weight(&graph, hops), 3);
        assert_eq!(stats.queries_served.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_through_real_authority() {
        let graph = reference_graph();

        let authority_listener = listen_tcp("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let authority_addr = authority_listener.local_addr().unwrap();
        let authority = GraphAuthority::new(graph.clone(), SessionConfig::default());
        tokio::spawn(async move { authority.serve(authority_listener).await });

        let source = AuthorityClient::new(authority_addr, SessionConfig::default());
        let (relay_addr, _stats) = spawn_relay(source).await;

        let client = QueryClient::new(relay_addr, SessionConfig::default());
        let reply = client.query('B', 'A').await.unwrap();

        let hops = reply.hops().expect("route must be found");
        assert_eq!(total_weight(&graph, hops), 3);
    }

    #[tokio::test]
    async fn test_no_route_reply() {
        let graph = reference_graph().with_node('Z');
        let (addr, stats) = spawn_relay(StaticGraphSource(graph)).await;

        let client = QueryClient::new(addr, SessionConfig::default());
        let reply = client.query('A', 'Z').await.unwrap();

        assert_eq!(reply, RouteReply::NoRoute);
        assert_eq!(stats.no_route_replies.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_source_equals_destination_single_hop() {
        let (addr, _stats) = spawn_relay(StaticGraphSource(reference_graph())).await;

        let client = QueryClient::new(addr, SessionConfig::default());
        let reply = client.query('C', 'C').await.unwrap();

        assert_eq!(reply.hops(), Some(&[Node::from('C')][..]));
    }

    #[tokio::test]
    async fn test_malformed_request_then_valid_one() {
        let graph = reference_graph();
        let (addr, stats) = spawn_relay(StaticGraphSource(graph.clone())).await;

        // Short request: a few stray bytes, then close
        {
            let mut stream = connect_tcp(addr).await.unwrap();
            stream.write_all(&[0x42]).await.unwrap();
            stream.shutdown().await.unwrap();

            // No reply arrives; the relay just closes
            let mut decoder = SessionConfig::default().decoder();
            let mut buffer = BytesMut::new();
            let result = read_frame(
                &mut stream,
                &mut decoder,
                &mut buffer,
                &SessionConfig::default(),
            )
            .await;
            assert!(matches!(result, Err(SessionError::Closed)));
        }

        // The loop is still serving
        let client = QueryClient::new(addr, SessionConfig::default());
        let reply = client.query('B', 'A').await.unwrap();
        assert!(reply.is_found());
        assert!(stats.sessions_aborted.load(Ordering::Relaxed) >= 1);
    }

    #[tokio::test]
    async fn test_authority_failure_abandons_session_without_reply() {
        let (addr, stats) = spawn_relay(FailingGraphSource).await;

        let client = QueryClient::new(addr, SessionConfig::default());
        let result = client.query('B', 'A').await;

        assert!(result.is_err());
        assert_eq!(stats.sessions_aborted.load(Ordering::Relaxed), 1);
    }
}
