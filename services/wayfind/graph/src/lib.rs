//! Weighted undirected topology and shortest-path computation for wayfind.
//!
//! This crate provides the in-memory graph owned by the authority and the
//! pure path-computation engine run by the relay: adjacency construction
//! from an edge set, snapshot conversion for the wire transfer, and Dijkstra
//! with full path reconstruction.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod path;
pub mod weighted;

pub use path::{compute_path, Route};
pub use weighted::{GraphError, WeightedGraph};
