//! Protocol message structures for the wire protocol.
//!
//! These are the CBOR bodies carried inside [`Graph`](crate::FrameType::Graph),
//! [`Query`](crate::FrameType::Query), and [`Reply`](crate::FrameType::Reply)
//! frames. Probe frames carry raw bytes and have no structured body.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier naming a vertex in the topology.
///
/// A single printable character in the reference deployment, but nothing in
/// the protocol assumes the token is one byte wide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Node(String);

impl Node {
    /// Create a node from any token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Node {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<char> for Node {
    fn from(token: char) -> Self {
        Self(token.to_string())
    }
}

/// One undirected weighted edge in a topology transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// One endpoint
    pub a: Node,
    /// The other endpoint
    pub b: Node,
    /// Non-negative traversal cost, same in both directions
    pub weight: u32,
}

impl EdgeRecord {
    /// Create a new edge record
    pub fn new(a: impl Into<Node>, b: impl Into<Node>, weight: u32) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            weight,
        }
    }
}

/// Full topology snapshot sent by the authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Every edge known to the authority
    pub edges: Vec<EdgeRecord>,
}

impl GraphSnapshot {
    /// Create a snapshot from an edge list
    pub fn new(edges: Vec<EdgeRecord>) -> Self {
        Self { edges }
    }
}

/// Route query sent by a client to the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuery {
    /// Starting node
    pub source: Node,
    /// Target node
    pub destination: Node,
}

impl RouteQuery {
    /// Create a new route query
    pub fn new(source: impl Into<Node>, destination: impl Into<Node>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Route reply sent by the relay to a client.
///
/// The reply is an explicit tagged value: a found route is a length-delimited
/// node sequence and can never be confused with the no-route case, whatever
/// tokens the node alphabet contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteReply {
    /// Ordered node sequence from source to destination inclusive
    Found {
        /// The hops, at least one entry
        hops: Vec<Node>,
    },
    /// No path exists between the queried endpoints
    NoRoute,
}

impl RouteReply {
    /// Whether a route was found
    pub fn is_found(&self) -> bool {
        matches!(self, RouteReply::Found { .. })
    }

    /// The hops of a found route, if any
    pub fn hops(&self) -> Option<&[Node]> {
        match self {
            RouteReply::Found { hops } => Some(hops),
            RouteReply::NoRoute => None,
        }
    }
}
