//! Configuration handling for the wayfind binary.
//!
//! Deployment configuration lives in a YAML file with built-in defaults and
//! environment-variable overrides. The file supplies the addresses each role
//! binds or dials, the optional per-operation timeout, and the topology the
//! authority serves. The protocol itself carries none of this.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use wayfind_graph::WeightedGraph;
use wayfind_session::SessionConfig;
use wayfind_wire::{EdgeRecord, DEFAULT_MAX_FRAME_SIZE};

/// The demo topology served when the config file does not supply one
static REFERENCE_TOPOLOGY: Lazy<Vec<EdgeEntry>> = Lazy::new(|| {
    vec![
        EdgeEntry::new("A", "D", 1),
        EdgeEntry::new("A", "B", 6),
        EdgeEntry::new("D", "B", 2),
        EdgeEntry::new("D", "E", 1),
        EdgeEntry::new("E", "B", 2),
        EdgeEntry::new("E", "C", 5),
        EdgeEntry::new("B", "C", 5),
    ]
});

/// One topology edge as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEntry {
    /// One endpoint
    pub a: String,
    /// The other endpoint
    pub b: String,
    /// Traversal cost
    pub weight: u32,
}

impl EdgeEntry {
    fn new(a: &str, b: &str, weight: u32) -> Self {
        Self {
            a: a.to_string(),
            b: b.to_string(),
            weight,
        }
    }
}

/// Wayfind deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WayfindConfig {
    /// Address the graph authority binds
    pub authority_listen: String,
    /// Address the relay binds for client queries
    pub relay_listen: String,
    /// Address the relay dials to reach the authority
    pub authority_target: String,
    /// Per-operation I/O timeout in seconds; absent means no timeout
    pub io_timeout_secs: Option<u64>,
    /// Maximum accepted frame size in bytes
    pub max_frame_bytes: usize,
    /// Topology served by the authority
    pub topology: Vec<EdgeEntry>,
}

impl Default for WayfindConfig {
    fn default() -> Self {
        Self {
            authority_listen: "127.0.0.1:12000".to_string(),
            relay_listen: "127.0.0.1:12001".to_string(),
            authority_target: "127.0.0.1:12000".to_string(),
            io_timeout_secs: None,
            max_frame_bytes: DEFAULT_MAX_FRAME_SIZE,
            topology: REFERENCE_TOPOLOGY.clone(),
        }
    }
}

impl WayfindConfig {
    /// Load configuration from file and environment variables
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config = Self::default();

        if let Ok(content) = std::fs::read_to_string(&config_path) {
            match serde_yaml::from_str::<WayfindConfig>(&content) {
                Ok(parsed) => {
                    config = parsed;
                    info!("Loaded configuration from {:?}", config_path.as_ref());
                }
                Err(e) => {
                    warn!(
                        "Failed to parse config file {:?} ({}), using defaults",
                        config_path.as_ref(),
                        e
                    );
                }
            }
        } else {
            warn!(
                "Config file {:?} not found, using defaults",
                config_path.as_ref()
            );
        }

        config.apply_environment_overrides();

        info!(
            "Final configuration: authority_listen={}, relay_listen={}, authority_target={}, {} topology edges",
            config.authority_listen,
            config.relay_listen,
            config.authority_target,
            config.topology.len()
        );

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_environment_overrides(&mut self) {
        if let Ok(addr) = std::env::var("WAYFIND_AUTHORITY_LISTEN") {
            info!("Authority listen address overridden by environment: {}", addr);
            self.authority_listen = addr;
        }

        if let Ok(addr) = std::env::var("WAYFIND_RELAY_LISTEN") {
            info!("Relay listen address overridden by environment: {}", addr);
            self.relay_listen = addr;
        }

        if let Ok(addr) = std::env::var("WAYFIND_AUTHORITY_TARGET") {
            info!("Authority target overridden by environment: {}", addr);
            self.authority_target = addr;
        }

        if let Ok(secs) = std::env::var("WAYFIND_IO_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                info!("I/O timeout overridden by environment: {}s", secs);
                self.io_timeout_secs = Some(secs);
            }
        }
    }

    /// Session configuration derived from this deployment configuration
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            io_timeout: self.io_timeout_secs.map(Duration::from_secs),
            max_frame_size: self.max_frame_bytes,
        }
    }

    /// Build the authority's topology from the configured edge list
    pub fn build_graph(&self) -> Result<WeightedGraph> {
        let edges = self
            .topology
            .iter()
            .map(|entry| EdgeRecord::new(entry.a.as_str(), entry.b.as_str(), entry.weight));
        WeightedGraph::from_edges(edges).context("invalid topology in configuration")
    }
}
