//! Graph authority, relay, and query client role loops for wayfind.
//!
//! This crate ties the wire protocol, the session plumbing, and the path
//! engine into the three cooperating roles:
//!
//! - [`GraphAuthority`] owns the topology and serves it whole, one snapshot
//!   per accepted connection, behind the probe handshake.
//! - [`RelayService`] accepts client queries, fetches the topology through a
//!   [`GraphSource`], computes the shortest path, and replies.
//! - [`QueryClient`] sends one query and decodes the reply.
//!
//! Every accepted connection runs in its own task; sessions share nothing
//! mutable. The relay's authority fetch always completes before its reply
//! is written.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authority;
pub mod client;
pub mod relay;

pub use authority::GraphAuthority;
pub use client::{render_route, QueryClient};
pub use relay::{AuthorityClient, GraphSource, RelayService, RelayStats};
