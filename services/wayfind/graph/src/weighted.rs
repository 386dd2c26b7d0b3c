//! Weighted undirected graph built from an edge set.

use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use wayfind_wire::{EdgeRecord, GraphSnapshot, Node};

/// Per-node neighbor list; node degree is small in practice
type NeighborList = SmallVec<[(Node, u32); 4]>;

/// Graph construction errors
#[derive(Error, Debug)]
pub enum GraphError {
    /// An edge connected a node to itself
    #[error("self loop on node {0}")]
    SelfLoop(Node),
}

/// The full set of nodes and undirected weighted edges known to the authority.
///
/// Built once from an edge iterator and immutable afterwards. Every stored
/// edge (u, v, w) permits traversal in both directions at cost w. Duplicate
/// unordered pairs collapse to the smaller weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightedGraph {
    /// Adjacency view, both directions of every edge included
    adjacency: HashMap<Node, NeighborList>,
    /// Canonical edge map keyed by ordered (min, max) node pair
    edges: BTreeMap<(Node, Node), u32>,
}

impl WeightedGraph {
    /// Build a graph from an edge set
    pub fn from_edges(
        edges: impl IntoIterator<Item = EdgeRecord>,
    ) -> Result<Self, GraphError> {
        let mut canonical: BTreeMap<(Node, Node), u32> = BTreeMap::new();

        for record in edges {
            if record.a == record.b {
                return Err(GraphError::SelfLoop(record.a));
            }
            let key = Self::edge_key(record.a, record.b);
            // Smaller weight wins when the same unordered pair appears twice
            canonical
                .entry(key)
                .and_modify(|weight| *weight = (*weight).min(record.weight))
                .or_insert(record.weight);
        }

        let mut adjacency: HashMap<Node, NeighborList> = HashMap::new();
        for ((a, b), weight) in &canonical {
            adjacency
                .entry(a.clone())
                .or_default()
                .push((b.clone(), *weight));
            adjacency
                .entry(b.clone())
                .or_default()
                .push((a.clone(), *weight));
        }

        Ok(Self {
            adjacency,
            edges: canonical,
        })
    }

    /// Build a graph from a received topology snapshot
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, GraphError> {
        Self::from_edges(snapshot.edges)
    }

    /// Serialize the graph back into a snapshot, edges in canonical order
    pub fn snapshot(&self) -> GraphSnapshot {
        let edges = self
            .edges
            .iter()
            .map(|((a, b), weight)| EdgeRecord::new(a.clone(), b.clone(), *weight))
            .collect();
        GraphSnapshot::new(edges)
    }

    /// Add an isolated node; legal and unreachable from everything else
    pub fn with_node(mut self, node: impl Into<Node>) -> Self {
        self.adjacency.entry(node.into()).or_default();
        self
    }

    /// Neighbors of a node with traversal costs, empty for unknown nodes
    pub fn neighbors(&self, node: &Node) -> &[(Node, u32)] {
        self.adjacency
            .get(node)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the node appears in the node set
    pub fn contains(&self, node: &Node) -> bool {
        self.adjacency.contains_key(node)
    }

    /// Weight of the edge between two nodes, if one exists
    pub fn edge_weight(&self, a: &Node, b: &Node) -> Option<u32> {
        let key = Self::edge_key(a.clone(), b.clone());
        self.edges.get(&key).copied()
    }

    /// Number of nodes, isolated nodes included
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn edge_key(a: Node, b: Node) -> (Node, Node) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}
