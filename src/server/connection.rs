// Connection handling module
// Serves one accepted TCP connection on its own task

use hyper::body::Incoming;
use hyper::header::CONTENT_LENGTH;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;

use super::stream::{BodyLengths, IsolatingStream};
use crate::config::AppState;
use crate::handler;
use crate::http::Isolated;
use crate::logger::{self, AccessLogEntry};

/// Handle a single connection in a spawned task.
///
/// Every service response leaves through the [`Isolated`] layer. Responses
/// hyper writes on its own, such as the 400 for an unparseable head, get the
/// same headers from [`IsolatingStream`].
pub fn serve_connection(stream: TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        let lengths = BodyLengths::default();
        let io = TokioIo::new(IsolatingStream::new(stream, lengths.clone()));

        let service = Isolated::new(service_fn(move |req: Request<Incoming>| {
            let state = Arc::clone(&state);
            let lengths = lengths.clone();
            async move {
                let is_head = req.method() == Method::HEAD;
                let mut entry = AccessLogEntry::new(
                    peer_addr.ip().to_string(),
                    req.method().to_string(),
                    req.uri()
                        .path_and_query()
                        .map_or_else(|| req.uri().to_string(), ToString::to_string),
                );
                entry.http_version = logger::version_label(req.version());

                let response = handler::handle_request(req, state).await?;
                lengths.record(is_head, &response);

                entry.status = response.status().as_u16();
                entry.body_bytes = response
                    .headers()
                    .get(CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                logger::log_access(&entry);
                Ok::<_, Infallible>(response)
            }
        }));

        if let Err(err) = http1::Builder::new()
            .keep_alive(true)
            .serve_connection(io, service)
            .await
        {
            logger::log_connection_error(&err);
        }
    });
}
