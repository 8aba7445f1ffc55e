// Listener module
// Resolves the bind address and creates the TCP listener

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::StartupError;

/// Resolve and bind the configured address
pub async fn bind(server: &ServerConfig) -> Result<TcpListener, StartupError> {
    let addr = resolve(server).await?;
    create_listener(addr).map_err(|source| StartupError::Bind { addr, source })
}

/// Resolve `host:port`, taking the first address for hostnames
pub async fn resolve(server: &ServerConfig) -> Result<SocketAddr, StartupError> {
    let resolve_error = |source| StartupError::Resolve {
        addr: server.display_addr(),
        source,
    };

    let mut addrs = tokio::net::lookup_host((server.host.as_str(), server.port))
        .await
        .map_err(resolve_error)?;
    addrs.next().ok_or_else(|| {
        resolve_error(io::Error::new(
            io::ErrorKind::NotFound,
            "no addresses found",
        ))
    })
}

/// Create a `TcpListener` bound to `addr`.
///
/// Only `SO_REUSEADDR` is set, and only on Unix, so a restart can reuse a
/// port in `TIME_WAIT` while a port held by a live listener still fails
/// with `AddrInUse`.
///
/// # Returns
///
/// * `Ok(TcpListener)` - Successfully created and bound listener
/// * `Err(std::io::Error)` - Failed to create or bind socket
pub fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    #[cfg(unix)]
    socket.set_reuse_address(true)?;

    // Set non-blocking mode for async compatibility
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;

    // Start listening with a backlog queue size of 128
    socket.listen(128)?;

    // Convert socket2::Socket to std::net::TcpListener, then to tokio::net::TcpListener
    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
