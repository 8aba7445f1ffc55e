//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, path
//! translation, then static file serving.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::path::{self, PathError, RequestPath};
use crate::http;
use crate::http::ResponseBody;
use crate::logger;
use hyper::header::{HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH, SERVER};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

pub const SERVER_NAME: &str = concat!("coi-serve/", env!("CARGO_PKG_VERSION"));

/// Request context encapsulating information needed for request processing
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Path component of the target, still percent-encoded
    pub raw_path: String,
    pub query: Option<String>,
    pub path: RequestPath,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
    pub has_if_none_match: bool,
}

impl RequestContext {
    /// `Location` for a directory requested without its trailing slash
    pub fn directory_redirect(&self) -> String {
        match &self.query {
            Some(query) => format!("{}/?{query}", self.raw_path),
            None => format!("{}/", self.raw_path),
        }
    }
}

/// Why a request is answered without touching the file system
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rejection {
    UnsupportedMethod(Method),
    BadPath { error: PathError, is_head: bool },
}

impl Rejection {
    fn into_response(self) -> Response<ResponseBody> {
        match self {
            Self::UnsupportedMethod(method) => http::build_501_response(method.as_str()),
            Self::BadPath {
                error: PathError::Malformed,
                is_head,
            } => http::build_400_response(is_head),
            Self::BadPath {
                error: PathError::Traversal,
                is_head,
            } => http::build_403_response(is_head),
        }
    }
}

/// Main entry point for HTTP request handling
///
/// The request body is never read.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible> {
    let ctx = build_context(&req);
    drop(req);

    let mut response = match ctx {
        Ok(ctx) => static_files::serve(&ctx, &state).await,
        Err(rejection) => rejection.into_response(),
    };
    response
        .headers_mut()
        .insert(SERVER, HeaderValue::from_static(SERVER_NAME));
    Ok(response)
}

fn build_context<B>(req: &Request<B>) -> Result<RequestContext, Rejection> {
    let method = req.method();
    let is_head = method == Method::HEAD;

    // 1. Check HTTP method
    check_http_method(method)?;

    // 2. Translate the path
    let raw_path = req.uri().path();
    let path = path::translate(raw_path).map_err(|error| {
        match error {
            PathError::Malformed => {
                logger::log_warning(&format!("Malformed request path: {raw_path}"));
            }
            PathError::Traversal => {
                logger::log_warning(&format!("Path traversal attempt blocked: {raw_path}"));
            }
        }
        Rejection::BadPath { error, is_head }
    })?;

    // 3. Extract validators
    let if_modified_since = req
        .headers()
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    Ok(RequestContext {
        raw_path: raw_path.to_string(),
        query: req.uri().query().map(ToString::to_string),
        path,
        is_head,
        if_modified_since,
        has_if_none_match: req.headers().contains_key(IF_NONE_MATCH),
    })
}

/// Only GET and HEAD are served; everything else is 501
fn check_http_method(method: &Method) -> Result<(), Rejection> {
    match *method {
        Method::GET | Method::HEAD => Ok(()),
        _ => {
            logger::log_warning(&format!("Unsupported method: {method}"));
            Err(Rejection::UnsupportedMethod(method.clone()))
        }
    }
}
