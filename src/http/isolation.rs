//! Cross-origin isolation headers
//!
//! `Cross-Origin-Opener-Policy: same-origin` together with
//! `Cross-Origin-Embedder-Policy: require-corp` puts the page into a
//! cross-origin isolated context, which `SharedArrayBuffer` and WASM threads
//! require. The policy is fixed and applies to every response, errors
//! included.
//!
//! [`Isolated`] wraps a whole service so no exit point of the handler can
//! skip the headers.

use hyper::header::{HeaderName, HeaderValue};
use hyper::service::Service;
use hyper::{Request, Response};
use std::future::Future;
use std::pin::Pin;

pub const CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");
pub const CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");

const SAME_ORIGIN: HeaderValue = HeaderValue::from_static("same-origin");
const REQUIRE_CORP: HeaderValue = HeaderValue::from_static("require-corp");

/// Set both isolation headers on a response
///
/// Existing values are replaced, so each header appears exactly once.
pub fn isolate<B>(mut response: Response<B>) -> Response<B> {
    let headers = response.headers_mut();
    headers.insert(CROSS_ORIGIN_OPENER_POLICY, SAME_ORIGIN);
    headers.insert(CROSS_ORIGIN_EMBEDDER_POLICY, REQUIRE_CORP);
    response
}

/// Service decorator applying [`isolate`] to every response of `S`
#[derive(Debug, Clone, Copy)]
pub struct Isolated<S> {
    inner: S,
}

impl<S> Isolated<S> {
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for Isolated<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<ReqBody>) -> Self::Future {
        let response = self.inner.call(req);
        Box::pin(async move { response.await.map(isolate) })
    }
}
