//! TCP transport for wayfind sessions.

use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

/// Create a TCP listener bound to the given address
pub async fn listen_tcp(addr: SocketAddr) -> tokio::io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

/// Connect to a TCP address
pub async fn connect_tcp(addr: SocketAddr) -> tokio::io::Result<TcpStream> {
    TcpStream::connect(addr).await
}
