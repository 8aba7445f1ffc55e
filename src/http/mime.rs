//! MIME type detection module
//!
//! `.wasm` and `.mjs` are pinned to the types browsers require for
//! `WebAssembly.instantiateStreaming` and module scripts. Everything else
//! goes through the extension table.

use std::ffi::OsStr;
use std::path::Path;

/// Suffix overrides, checked in order before the extension table
const OVERRIDES: [(&str, &str); 2] = [
    (".wasm", "application/wasm"),
    (".mjs", "application/javascript"),
];

/// Resolve the `Content-Type` for a file path
///
/// # Examples
/// ```ignore
/// assert_eq!(resolve_mime_type(Path::new("pkg/app.wasm")), "application/wasm");
/// assert_eq!(resolve_mime_type(Path::new("index.html")), "text/html");
/// ```
pub fn resolve_mime_type(path: &Path) -> &'static str {
    let name = path.to_string_lossy();
    for (suffix, content_type) in OVERRIDES {
        if name.ends_with(suffix) {
            return content_type;
        }
    }

    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    get_content_type(extension.as_deref())
}

/// Get MIME Content-Type based on a lowercase file extension
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        // Text
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("xml") => "application/xml",

        // JavaScript/WASM
        Some("js") => "text/javascript",
        Some("json" | "map") => "application/json",
        // Only upper-case names such as APP.WASM get here; the suffix
        // overrides are case-sensitive. Same types as the overrides.
        Some("wasm") => "application/wasm",
        Some("mjs") => "application/javascript",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/vnd.microsoft.icon",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("bmp") => "image/bmp",

        // Video
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogv") => "video/ogg",
        Some("mov") => "video/quicktime",

        // Audio
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/x-wav",
        Some("ogg" | "oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("m4a") => "audio/mp4",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents and archives
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        Some("tar") => "application/x-tar",

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        assert_eq!(resolve_mime_type(Path::new("pkg/app.wasm")), "application/wasm");
        assert_eq!(
            resolve_mime_type(Path::new("/srv/www/worker.mjs")),
            "application/javascript"
        );
    }

    #[test]
    fn test_common_types() {
        assert_eq!(resolve_mime_type(Path::new("index.html")), "text/html");
        assert_eq!(resolve_mime_type(Path::new("style.css")), "text/css");
        assert_eq!(resolve_mime_type(Path::new("main.js")), "text/javascript");
        assert_eq!(resolve_mime_type(Path::new("data.json")), "application/json");
        assert_eq!(resolve_mime_type(Path::new("logo.png")), "image/png");
        assert_eq!(resolve_mime_type(Path::new("icon.svg")), "image/svg+xml");
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(resolve_mime_type(Path::new("INDEX.HTML")), "text/html");
        assert_eq!(resolve_mime_type(Path::new("Photo.JPG")), "image/jpeg");
    }

    #[test]
    fn test_upper_case_override_names_match_overrides() {
        assert_eq!(resolve_mime_type(Path::new("APP.WASM")), "application/wasm");
        assert_eq!(resolve_mime_type(Path::new("Worker.MJS")), "application/javascript");
        assert_eq!(get_content_type(Some("mjs")), "application/javascript");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(resolve_mime_type(Path::new("blob.xyz")), "application/octet-stream");
        assert_eq!(resolve_mime_type(Path::new("Makefile")), "application/octet-stream");
        assert_eq!(get_content_type(None), "application/octet-stream");
    }

    #[test]
    fn test_override_needs_suffix() {
        // ".wasm" in a directory name does not count
        assert_eq!(
            resolve_mime_type(Path::new("app.wasm.d/readme.txt")),
            "text/plain"
        );
    }
}
