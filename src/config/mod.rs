// Configuration module entry point
// Bind configuration from positional arguments and the shared request state

mod state;
mod types;

pub use state::AppState;
pub use types::{Config, ServerConfig};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

impl Config {
    /// Load configuration from positional arguments: `[port] [bind_address]`
    ///
    /// Missing arguments fall back to `127.0.0.1:8080`. Arguments past the
    /// second are ignored.
    pub fn from_args<I, S>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let port = args.next();
        let host = args.next();

        let settings = config::Config::builder()
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_override_option("server.port", port)?
            .set_override_option("server.host", host)?
            .build()?;

        settings.try_deserialize()
    }
}

impl ServerConfig {
    /// `host:port` as given, used for log lines and error messages
    pub fn display_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
