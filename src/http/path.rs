//! Request path translation
//!
//! Maps the path component of a request target onto a path relative to the
//! document root. `..` may move within the root but never above it.

use percent_encoding::percent_decode_str;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Not valid UTF-8 after decoding, or contains a forbidden byte
    Malformed,
    /// A `..` segment climbs above the document root
    Traversal,
}

/// Decoded request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    /// Path relative to the document root, empty for the root itself
    pub relative: PathBuf,
    /// Percent-decoded path as requested, used for listing titles
    pub decoded: String,
    /// Target ended in `/`
    pub trailing_slash: bool,
}

/// Translate a request path such as `/pkg/app%20v2.wasm`
pub fn translate(raw_path: &str) -> Result<RequestPath, PathError> {
    // hyper already split off the query; a fragment should never be sent
    let raw_path = raw_path.split(['?', '#']).next().unwrap_or_default();

    let decoded = percent_decode_str(raw_path)
        .decode_utf8()
        .map_err(|_| PathError::Malformed)?
        .into_owned();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathError::Traversal);
                }
            }
            _ if !is_safe_segment(segment) => return Err(PathError::Malformed),
            _ => segments.push(segment),
        }
    }

    let relative = segments.iter().collect::<PathBuf>();
    let trailing_slash = decoded.ends_with('/');

    Ok(RequestPath {
        relative,
        decoded,
        trailing_slash,
    })
}

#[cfg(not(windows))]
fn is_safe_segment(segment: &str) -> bool {
    !segment.contains('\0')
}

#[cfg(windows)]
fn is_safe_segment(segment: &str) -> bool {
    !segment.contains(['\0', '\\', ':'])
}
