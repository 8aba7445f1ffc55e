//! Logger module
//!
//! Thin facade over `tracing` covering:
//! - Server lifecycle logging
//! - Access logging in Common Log Format
//! - Error and warning logging
//!
//! Everything is written to stderr. The filter is fixed; no environment
//! variable is consulted.

mod format;

pub use format::{version_label, AccessLogEntry};

use crate::config::ServerConfig;
use crate::error::StartupError;
use std::net::SocketAddr;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILTER: &str = "coi_serve=info";

/// Install the global subscriber
///
/// Should be called once at application startup. Later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(LOG_FILTER))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

pub fn log_server_start(server: &ServerConfig, local_addr: &SocketAddr, root: &Path) {
    let bound = ServerConfig {
        host: server.host.clone(),
        port: local_addr.port(),
    };
    tracing::info!(
        "Serving on http://{} with COOP/COEP headers",
        bound.display_addr()
    );
    tracing::info!("Bound socket: {local_addr}");
    tracing::info!("Document root: {}", root.display());
}

pub fn log_startup_failure(err: &StartupError) {
    tracing::error!("{err}");
}

pub fn log_signal(name: &str) {
    tracing::info!("{name} received");
}

pub fn log_shutdown() {
    tracing::info!("Shutting down.");
}

pub fn log_connection_error(err: &hyper::Error) {
    tracing::debug!("Failed to serve connection: {err}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry) {
    tracing::info!(target: "coi_serve::access", "{}", entry.format_common());
}
