//! TCP transport, frame send/recv with timeouts, and the probe handshake for wayfind.
//!
//! This crate provides the per-connection plumbing shared by the authority,
//! the relay, and the query client: listener/dialer helpers, whole-frame
//! read/write with an optional per-operation timeout, and the connectivity
//! probe exchanged before the graph transfer.
//!
//! A session is the lifetime of one accepted or dialed connection. Sessions
//! own their socket, decoder, and buffers exclusively and release them on
//! every exit path; nothing is shared across sessions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod probe;
pub mod session;
pub mod transport;

// Re-export main types
pub use probe::{answer_probe, initiate_probe, DEFAULT_PROBE};
pub use session::{read_frame, with_timeout, write_frame, SessionConfig, SessionError};
pub use transport::{connect_tcp, listen_tcp};
