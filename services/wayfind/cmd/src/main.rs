//! Wayfind service binary.
//!
//! One binary runs all three roles: the graph authority, the relay, and the
//! one-shot query client. Deployment configuration (addresses, timeout,
//! topology) comes from a YAML file with environment and flag overrides;
//! the protocol itself is configuration-free.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wayfind_service::{
    render_route, AuthorityClient, GraphAuthority, QueryClient, RelayService,
};
use wayfind_session::listen_tcp;
use wayfind_wire::RouteReply;

mod config;
mod logging;

use config::WayfindConfig;
use logging::WayfindLogFormatter;

/// Relayed shortest-route query service
#[derive(Parser, Debug)]
#[command(name = "wayfind", version, about = "Relayed shortest-route query service")]
struct Args {
    /// Configuration file path
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Per-operation I/O timeout, e.g. 5s; overrides the config file
    #[arg(long)]
    io_timeout: Option<humantime::Duration>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the graph authority
    Authority {
        /// Listen address, e.g. 0.0.0.0:12000; overrides the config file
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
    /// Run the relay
    Relay {
        /// Listen address for client queries; overrides the config file
        #[arg(long)]
        listen: Option<SocketAddr>,
        /// Authority address to fetch the topology from; overrides the config file
        #[arg(long)]
        authority: Option<SocketAddr>,
    },
    /// Send one route query to a relay and print the result
    Query {
        /// Relay address; overrides the config file
        #[arg(long)]
        relay: Option<SocketAddr>,
        /// Source node token
        source: String,
        /// Destination node token
        destination: String,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let role = match &args.command {
        Command::Authority { .. } => "authority",
        Command::Relay { .. } => "relay",
        Command::Query { .. } => "query",
    };

    let env_filter = EnvFilter::new("info")
        .add_directive(format!("wayfind={}", args.log_level).parse()?)
        .add_directive(format!("wayfind_wire={}", args.log_level).parse()?)
        .add_directive(format!("wayfind_graph={}", args.log_level).parse()?)
        .add_directive(format!("wayfind_session={}", args.log_level).parse()?)
        .add_directive(format!("wayfind_service={}", args.log_level).parse()?);

    let formatter = WayfindLogFormatter::new(format!("wayfind-{}", role));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(true)
        .event_format(formatter)
        .init();

    let mut config = WayfindConfig::load_from_file(&args.config)?;
    if let Some(timeout) = args.io_timeout {
        config.io_timeout_secs = Some(timeout.as_secs());
    }

    match args.command {
        Command::Authority { listen } => run_authority(config, listen).await,
        Command::Relay { listen, authority } => run_relay(config, listen, authority).await,
        Command::Query {
            relay,
            source,
            destination,
        } => run_query(config, relay, source, destination).await,
    }
}

async fn run_authority(config: WayfindConfig, listen: Option<SocketAddr>) -> anyhow::Result<()> {
    let listen_addr = match listen {
        Some(addr) => addr,
        None => config.authority_listen.parse()?,
    };

    let graph = config.build_graph()?;
    component_info!(
        "authority",
        "Starting graph authority v{} with {} nodes, {} edges",
        env!("CARGO_PKG_VERSION"),
        graph.node_count(),
        graph.edge_count()
    );

    let authority = GraphAuthority::new(graph, config.session_config());
    let listener = listen_tcp(listen_addr).await?;

    tokio::select! {
        result = authority.serve(listener) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping authority");
            Ok(())
        }
    }
}

async fn run_relay(
    config: WayfindConfig,
    listen: Option<SocketAddr>,
    authority: Option<SocketAddr>,
) -> anyhow::Result<()> {
    let listen_addr = match listen {
        Some(addr) => addr,
        None => config.relay_listen.parse()?,
    };
    let authority_addr = match authority {
        Some(addr) => addr,
        None => config.authority_target.parse()?,
    };

    component_info!(
        "relay",
        "Starting relay v{}, authority at {}",
        env!("CARGO_PKG_VERSION"),
        authority_addr
    );

    let source = AuthorityClient::new(authority_addr, config.session_config());
    let relay = RelayService::new(source, config.session_config());
    let stats = relay.stats();
    let listener = listen_tcp(listen_addr).await?;

    let result = tokio::select! {
        result = relay.serve(listener) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping relay");
            Ok(())
        }
    };

    component_info!(
        "relay",
        "Served {} routes, {} no-route replies, {} aborted sessions",
        stats.queries_served.load(std::sync::atomic::Ordering::Relaxed),
        stats.no_route_replies.load(std::sync::atomic::Ordering::Relaxed),
        stats.sessions_aborted.load(std::sync::atomic::Ordering::Relaxed)
    );

    result
}

async fn run_query(
    config: WayfindConfig,
    relay: Option<SocketAddr>,
    source: String,
    destination: String,
) -> anyhow::Result<()> {
    let relay_addr = match relay {
        Some(addr) => addr,
        None => config.relay_listen.parse()?,
    };

    let client = QueryClient::new(relay_addr, config.session_config());
    let reply = client.query(source.as_str(), destination.as_str()).await?;

    match reply {
        RouteReply::Found { hops } => {
            println!("Here is the shortest route: {}", render_route(&hops));
        }
        RouteReply::NoRoute => {
            println!("No route exists from {} to {}", source, destination);
        }
    }

    Ok(())
}
