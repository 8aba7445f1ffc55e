// Configuration types module

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
}

/// Address the listener binds to, fixed for the process lifetime
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP address or hostname
    pub host: String,
    pub port: u16,
}
