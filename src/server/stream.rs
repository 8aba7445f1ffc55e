//! Transport-level isolation for responses hyper writes itself
//!
//! hyper answers requests it cannot parse (bad header lines, oversized
//! heads, unsupported versions) without calling the service, so
//! [`Isolated`](crate::http::Isolated) never sees those responses.
//! [`IsolatingStream`] watches the response heads going out on the socket
//! and adds both isolation headers to any head that lacks them.
//!
//! Bodies are never inspected. The service records the body length of each
//! response in [`BodyLengths`], and the stream forwards that many bytes
//! after the head before it looks for the next one.

use hyper::body::Body;
use hyper::{Response, StatusCode};
use std::collections::VecDeque;
use std::io;
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Inserted before the blank line that ends a head
const ISOLATION_LINES: &[u8] =
    b"cross-origin-opener-policy: same-origin\r\ncross-origin-embedder-policy: require-corp\r\n";

/// Marks heads the service produced; [`Isolated`](crate::http::Isolated) always sets it
const OPENER_POLICY_LINE: &[u8] = b"\r\ncross-origin-opener-policy:";

const HEAD_END: &[u8] = b"\r\n\r\n";

/// Larger "heads" are not ours to rewrite; the stream stops looking
const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Body lengths of service responses, in the order hyper writes them
///
/// `None` marks a body without a known length; the stream then stops
/// tracking the connection.
#[derive(Debug, Clone, Default)]
pub struct BodyLengths(Arc<Mutex<VecDeque<Option<u64>>>>);

impl BodyLengths {
    /// Record how many body bytes hyper will write for `response`
    pub fn record<B: Body>(&self, is_head: bool, response: &Response<B>) {
        let status = response.status();
        let len = if is_head
            || status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED
        {
            Some(0)
        } else {
            response.body().size_hint().exact()
        };
        self.queue().push_back(len);
    }

    fn next(&self) -> Option<u64> {
        self.queue().pop_front().flatten()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Option<u64>>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Collecting the next response head
    Head,
    /// Forwarding this many body bytes
    Body(u64),
    /// Framing unknown, forward everything as is
    Passthrough,
}

/// Socket wrapper that guarantees isolation headers on every response head
#[derive(Debug)]
pub struct IsolatingStream<S> {
    inner: S,
    lengths: BodyLengths,
    phase: Phase,
    /// Head bytes accepted from hyper, not yet complete
    head: Vec<u8>,
    /// Bytes accepted from hyper, waiting for the socket
    pending: Vec<u8>,
    flushed: usize,
}

impl<S> IsolatingStream<S> {
    pub const fn new(inner: S, lengths: BodyLengths) -> Self {
        Self {
            inner,
            lengths,
            phase: Phase::Head,
            head: Vec::new(),
            pending: Vec::new(),
            flushed: 0,
        }
    }

    /// Take head bytes from `buf`, returning how many were consumed
    fn take_head_bytes(&mut self, buf: &[u8]) -> usize {
        let search_from = self.head.len().saturating_sub(HEAD_END.len() - 1);
        self.head.extend_from_slice(buf);

        let Some(pos) = find(&self.head[search_from..], HEAD_END) else {
            if self.head.len() > MAX_HEAD_SIZE {
                let head = mem::take(&mut self.head);
                self.pending.extend_from_slice(&head);
                self.phase = Phase::Passthrough;
            }
            return buf.len();
        };

        let end = search_from + pos + HEAD_END.len();
        let consumed = buf.len() - (self.head.len() - end);
        self.head.truncate(end);
        let head = mem::take(&mut self.head);
        self.finish_head(head);
        consumed
    }

    fn finish_head(&mut self, mut head: Vec<u8>) {
        if contains_ignore_case(&head, OPENER_POLICY_LINE) {
            self.phase = match self.lengths.next() {
                Some(0) => Phase::Head,
                Some(len) => Phase::Body(len),
                None => Phase::Passthrough,
            };
        } else {
            // hyper's own responses carry no body
            let at = head.len() - 2;
            head.splice(at..at, ISOLATION_LINES.iter().copied());
            self.phase = Phase::Head;
        }
        self.pending.extend_from_slice(&head);
    }
}

impl<S: AsyncWrite + Unpin> IsolatingStream<S> {
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while self.flushed < self.pending.len() {
            let unsent = &self.pending[self.flushed..];
            let n = ready!(Pin::new(&mut self.inner).poll_write(cx, unsent))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.flushed += n;
        }
        self.pending.clear();
        self.flushed = 0;
        Poll::Ready(Ok(()))
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for IsolatingStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for IsolatingStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        match this.phase {
            Phase::Passthrough => Pin::new(&mut this.inner).poll_write(cx, buf),
            Phase::Body(remaining) => {
                let len = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
                let n = ready!(Pin::new(&mut this.inner).poll_write(cx, &buf[..len]))?;
                this.phase = match remaining - n as u64 {
                    0 => Phase::Head,
                    left => Phase::Body(left),
                };
                Poll::Ready(Ok(n))
            }
            Phase::Head => {
                let consumed = this.take_head_bytes(buf);
                // The bytes are accepted either way; a pending drain resumes
                // on the next write or flush
                if let Poll::Ready(Err(e)) = this.poll_drain(cx) {
                    return Poll::Ready(Err(e));
                }
                Poll::Ready(Ok(consumed))
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn contains_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle))
}
