//! Access log format module
//!
//! Common Log Format (CLF):
//! `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`

use chrono::Local;
use hyper::Version;

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address
    pub remote_addr: String,
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    /// HTTP method (GET, HEAD, ...)
    pub method: String,
    /// Request target as received, query string included
    pub target: String,
    /// HTTP version (1.0, 1.1, 2)
    pub http_version: &'static str,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes, when known
    pub body_bytes: Option<u64>,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, target: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            target,
            http_version: "1.1",
            status: 200,
            body_bytes: None,
        }
    }

    pub fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.target,
            self.http_version,
            self.status,
            self.body_bytes
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
        )
    }
}

/// Version number as it appears in a request line
pub fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
