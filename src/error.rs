//! Startup error taxonomy
//!
//! Everything here is fatal: `main` logs the error and exits non-zero.
//! Per-request failures never surface as errors, they become HTTP statuses.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    /// Positional arguments could not be turned into a bind configuration
    #[error("invalid arguments: {0}")]
    Config(#[from] config::ConfigError),

    #[error("could not resolve bind address {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Socket creation, bind or listen failed (port in use, permission denied)
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("document root {} is not usable: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[source] io::Error),
}
