//! Static file serving module
//!
//! Maps a translated request path onto the document root and answers with
//! the file, an index file, a directory listing or an error.

use crate::config::AppState;
use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, FileBody, ResponseBody};
use crate::logger;
use hyper::{Response, StatusCode};
use std::fs::Metadata;
use std::io;
use std::path::Path;
use tokio::fs;

/// Tried in order when a directory is requested
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Serve the entry `ctx` points at
pub async fn serve(ctx: &RequestContext, state: &AppState) -> Response<ResponseBody> {
    let path = state.root.join(&ctx.path.relative);

    if let Err(response) = ensure_within_root(&path, state, ctx).await {
        return response;
    }

    let metadata = match fs::metadata(&path).await {
        Ok(m) => m,
        Err(e) => return lookup_error_response(&e, ctx.is_head),
    };

    if metadata.is_dir() {
        return serve_directory(ctx, state, &path).await;
    }

    // "/file.txt/" names a directory that does not exist
    if ctx.path.trailing_slash || !metadata.is_file() {
        return http::build_404_response(ctx.is_head);
    }

    serve_file(ctx, &path, &metadata).await
}

/// Reject entries whose canonical location lies outside the root
///
/// Request paths are already free of `..`; this catches symlinks.
async fn ensure_within_root(
    path: &Path,
    state: &AppState,
    ctx: &RequestContext,
) -> Result<(), Response<ResponseBody>> {
    // File not found is common (404), no need to log at warning level
    let canonical = fs::canonicalize(path)
        .await
        .map_err(|e| lookup_error_response(&e, ctx.is_head))?;

    if canonical.starts_with(&state.root) {
        Ok(())
    } else {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            ctx.raw_path,
            canonical.display()
        ));
        Err(http::build_403_response(ctx.is_head))
    }
}

async fn serve_directory(
    ctx: &RequestContext,
    state: &AppState,
    dir: &Path,
) -> Response<ResponseBody> {
    // Relative links in the listing only resolve with a trailing slash
    if !ctx.path.trailing_slash {
        return http::build_redirect_response(&ctx.directory_redirect());
    }

    for index_file in INDEX_FILES {
        let index_path = dir.join(index_file);
        let Ok(metadata) = fs::metadata(&index_path).await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        if let Err(response) = ensure_within_root(&index_path, state, ctx).await {
            return response;
        }
        return serve_file(ctx, &index_path, &metadata).await;
    }

    match listing::render(dir, &ctx.path.decoded).await {
        Ok(html) => http::build_html_response(html, ctx.is_head),
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to list directory '{}': {e}",
                dir.display()
            ));
            http::build_error_response(
                StatusCode::NOT_FOUND,
                "No permission to list directory.",
                ctx.is_head,
            )
        }
    }
}

async fn serve_file(
    ctx: &RequestContext,
    path: &Path,
    metadata: &Metadata,
) -> Response<ResponseBody> {
    let modified = metadata.modified().ok();
    let last_modified = modified.map(cache::format_http_date);

    if let (Some(modified), Some(last_modified)) = (modified, last_modified.as_deref()) {
        if cache::is_not_modified(
            ctx.if_modified_since.as_deref(),
            ctx.has_if_none_match,
            modified,
        ) {
            return http::build_304_response(last_modified);
        }
    }

    // Opened for HEAD too, so an unreadable file answers the same way
    let file = match fs::File::open(path).await {
        Ok(f) => f,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to open file '{}': {e}",
                path.display()
            ));
            return read_error_response(&e, ctx.is_head);
        }
    };

    // The requested name decides the type, not a symlink target
    let content_type = http::resolve_mime_type(path);

    http::build_file_response(
        FileBody::new(file, metadata.len()),
        content_type,
        last_modified.as_deref(),
        ctx.is_head,
    )
}

/// Map a failed lookup (canonicalize, metadata) to a status
fn lookup_error_response(err: &io::Error, is_head: bool) -> Response<ResponseBody> {
    match err.kind() {
        io::ErrorKind::PermissionDenied => http::build_403_response(is_head),
        _ => http::build_404_response(is_head),
    }
}

/// Map a failed open to a status
fn read_error_response(err: &io::Error, is_head: bool) -> Response<ResponseBody> {
    match err.kind() {
        io::ErrorKind::NotFound => http::build_404_response(is_head),
        io::ErrorKind::PermissionDenied => http::build_403_response(is_head),
        _ => http::build_500_response(is_head),
    }
}
