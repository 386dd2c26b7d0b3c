//! Shortest path computation over a weighted graph.

use crate::weighted::WeightedGraph;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use tracing::debug;
use wayfind_wire::Node;

/// A computed route between two nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Ordered node sequence from source to destination inclusive
    pub hops: Vec<Node>,
    /// Sum of traversed edge weights
    pub total_weight: u32,
}

/// Compute the shortest path between two nodes.
///
/// Dijkstra over the undirected adjacency view; correct because all weights
/// are non-negative. Returns `None` when the destination is unreachable,
/// including when either endpoint is absent from the graph. An absent node
/// behaves as having no incident edges. When source and destination are the
/// same node the route is the single-node sequence of weight zero.
///
/// When several shortest paths tie, which one is returned depends on frontier
/// extraction order; the order is stable for a given graph build.
pub fn compute_path(graph: &WeightedGraph, source: &Node, destination: &Node) -> Option<Route> {
    if source == destination {
        return Some(Route {
            hops: vec![source.clone()],
            total_weight: 0,
        });
    }

    let mut distances: HashMap<Node, u32> = HashMap::new();
    let mut previous: HashMap<Node, Node> = HashMap::new();
    let mut frontier: BinaryHeap<Reverse<(u32, Node)>> = BinaryHeap::new();

    distances.insert(source.clone(), 0);
    frontier.push(Reverse((0, source.clone())));

    while let Some(Reverse((current_dist, current_node))) = frontier.pop() {
        if current_node == *destination {
            let route = Route {
                hops: walk_back(&previous, source, destination),
                total_weight: current_dist,
            };
            debug!(
                "Shortest path {} -> {} found: {} hops, weight {}",
                source,
                destination,
                route.hops.len(),
                route.total_weight
            );
            return Some(route);
        }

        // Skip if we've already found a better path
        if current_dist > distances.get(&current_node).copied().unwrap_or(u32::MAX) {
            continue;
        }

        for (neighbor, weight) in graph.neighbors(&current_node) {
            let new_dist = current_dist.saturating_add(*weight);
            let existing_dist = distances.get(neighbor).copied().unwrap_or(u32::MAX);

            if new_dist < existing_dist {
                distances.insert(neighbor.clone(), new_dist);
                previous.insert(neighbor.clone(), current_node.clone());
                frontier.push(Reverse((new_dist, neighbor.clone())));
            }
        }
    }

    debug!("No path from {} to {}", source, destination);
    None
}

/// Rebuild the hop sequence by walking the predecessor map back from the
/// destination. Only called once the destination has been extracted, so the
/// chain is complete.
fn walk_back(previous: &HashMap<Node, Node>, source: &Node, destination: &Node) -> Vec<Node> {
    let mut hops = vec![destination.clone()];
    let mut cursor = destination;

    while cursor != source {
        let prev = &previous[cursor];
        hops.push(prev.clone());
        cursor = prev;
    }

    hops.reverse();
    hops
}
