// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::serve_connection;
use crate::config::AppState;
use crate::logger;

/// Accept connections and serve each on its own task
///
/// Returns once `shutdown` completes. The listener is dropped on return;
/// connections still in flight are not drained.
pub async fn run<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        serve_connection(stream, peer_addr, Arc::clone(&state));
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => break,
        }
    }

    drop(listener);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::listener::create_listener;
    use crate::test_support::TempRoot;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    struct RunningServer {
        addr: SocketAddr,
        stop: oneshot::Sender<()>,
        handle: JoinHandle<()>,
    }

    impl RunningServer {
        async fn start(root: &TempRoot) -> Self {
            let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
            let addr = listener.local_addr().unwrap();
            let state = Arc::new(AppState::new(root.path()).unwrap());
            let (stop, stopped) = oneshot::channel::<()>();
            let handle = tokio::spawn(run(listener, state, async move {
                let _ = stopped.await;
            }));
            Self { addr, stop, handle }
        }

        async fn stop(self) {
            self.stop.send(()).unwrap();
            self.handle.await.unwrap();
        }
    }

    struct RawResponse {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    impl RawResponse {
        fn header_count(&self, name: &str) -> usize {
            self.headers.iter().filter(|(n, _)| n == name).count()
        }

        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
        }

        fn assert_isolated(&self) {
            assert_eq!(self.header_count("cross-origin-opener-policy"), 1);
            assert_eq!(self.header_count("cross-origin-embedder-policy"), 1);
            assert_eq!(self.header("cross-origin-opener-policy"), Some("same-origin"));
            assert_eq!(self.header("cross-origin-embedder-policy"), Some("require-corp"));
        }
    }

    /// Write `request` on a fresh connection and read until the server closes it
    async fn exchange(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request).await.unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        raw
    }

    async fn send(addr: SocketAddr, method: &str, target: &str) -> RawResponse {
        let request = format!(
            "{method} {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"
        );
        parse_response(&exchange(addr, request.as_bytes()).await)
    }

    fn parse_response(raw: &[u8]) -> RawResponse {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("complete header block");
        let head = String::from_utf8(raw[..split].to_vec()).unwrap();
        let body = raw[split + 4..].to_vec();

        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap();
        let status = status_line.split(' ').nth(1).unwrap().parse().unwrap();
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();

        RawResponse {
            status,
            headers,
            body,
        }
    }

    #[tokio::test]
    async fn test_index_served_with_isolation_headers() {
        let root = TempRoot::new();
        root.write("index.html", b"<!doctype html><title>app</title>");
        let server = RunningServer::start(&root).await;

        let response = send(server.addr, "GET", "/index.html").await;
        assert_eq!(response.status, 200);
        response.assert_isolated();
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.body, b"<!doctype html><title>app</title>");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_errors_carry_isolation_headers() {
        let root = TempRoot::new();
        root.mkdir("docs");
        let server = RunningServer::start(&root).await;

        let missing = send(server.addr, "GET", "/missing.wasm").await;
        assert_eq!(missing.status, 404);
        missing.assert_isolated();

        let traversal = send(server.addr, "GET", "/../../etc/passwd").await;
        assert!(matches!(traversal.status, 403 | 404));
        traversal.assert_isolated();

        let post = send(server.addr, "POST", "/").await;
        assert_eq!(post.status, 501);
        post.assert_isolated();

        let redirect = send(server.addr, "GET", "/docs").await;
        assert_eq!(redirect.status, 301);
        assert_eq!(redirect.header("location"), Some("/docs/"));
        redirect.assert_isolated();

        server.stop().await;
    }

    #[tokio::test]
    async fn test_wasm_served_with_override() {
        let root = TempRoot::new();
        root.write("pkg/module.wasm", b"\0asm\x01\0\0\0");
        root.write("pkg/glue.mjs", b"export default 1;");
        let server = RunningServer::start(&root).await;

        let wasm = send(server.addr, "GET", "/pkg/module.wasm").await;
        assert_eq!(wasm.status, 200);
        assert_eq!(wasm.header("content-type"), Some("application/wasm"));
        assert_eq!(wasm.body, b"\0asm\x01\0\0\0");
        wasm.assert_isolated();

        let mjs = send(server.addr, "HEAD", "/pkg/glue.mjs").await;
        assert_eq!(mjs.status, 200);
        assert_eq!(mjs.header("content-type"), Some("application/javascript"));
        assert_eq!(mjs.header("content-length"), Some("17"));
        assert!(mjs.body.is_empty());
        mjs.assert_isolated();

        server.stop().await;
    }

    #[tokio::test]
    async fn test_unparseable_requests_carry_isolation_headers() {
        let root = TempRoot::new();
        let server = RunningServer::start(&root).await;

        for request in [
            &b"GET / HTTP/1.1\r\nBad Header Line\r\n\r\n"[..],
            &b"GARBAGE\r\n\r\n"[..],
        ] {
            let response = parse_response(&exchange(server.addr, request).await);
            assert_eq!(response.status, 400);
            response.assert_isolated();
        }

        server.stop().await;
    }

    #[tokio::test]
    async fn test_keep_alive_body_untouched_before_rejection() {
        let root = TempRoot::new();
        // Looks like a response head but is file content
        let content = b"HTTP/1.1 200 OK\r\nx-fake: 1\r\n\r\n";
        root.write("fake.txt", content);
        let server = RunningServer::start(&root).await;

        let raw = exchange(
            server.addr,
            b"GET /fake.txt HTTP/1.1\r\nHost: test\r\n\r\n\
              GET / HTTP/1.1\r\nBad Header Line\r\n\r\n",
        )
        .await;

        let first = parse_response(&raw);
        assert_eq!(first.status, 200);
        first.assert_isolated();
        assert!(first.body.starts_with(content));

        // The file body arrives verbatim, then hyper's 400 follows it
        let second = parse_response(&first.body[content.len()..]);
        assert_eq!(second.status, 400);
        second.assert_isolated();

        let text = String::from_utf8_lossy(&raw);
        assert_eq!(text.matches("cross-origin-opener-policy").count(), 2);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_listener_closed_after_shutdown() {
        let root = TempRoot::new();
        let server = RunningServer::start(&root).await;
        let addr = server.addr;
        server.stop().await;

        assert!(TcpStream::connect(addr).await.is_err());
    }
}
