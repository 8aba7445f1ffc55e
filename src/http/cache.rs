//! HTTP cache validation module
//!
//! `Last-Modified` / `If-Modified-Since` handling. No `ETag`s and no
//! `Cache-Control`: conditional GET on modification time is all the
//! server offers.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// Format a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an HTTP date header value
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Check whether a conditional request can be answered with 304
///
/// `If-None-Match` takes precedence over `If-Modified-Since`; since no
/// `ETag`s are issued its presence disables the shortcut. The file time is
/// compared at whole-second precision, like the header itself.
///
/// # Returns
/// Returns true if the client copy is current (should return 304)
pub fn is_not_modified(
    if_modified_since: Option<&str>,
    has_if_none_match: bool,
    modified: SystemTime,
) -> bool {
    if has_if_none_match {
        return false;
    }
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };
    let modified: DateTime<Utc> = modified.into();
    modified.timestamp() <= since.timestamp()
}
