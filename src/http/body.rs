//! Response body types
//!
//! Small generated bodies (error pages, listings) are sent in one frame.
//! Files are streamed from disk in chunks so large assets are never held in
//! memory as a whole.

use http_body_util::Full;
use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};

/// Bytes read from disk per frame
const CHUNK_SIZE: u64 = 64 * 1024;

/// Body of every response the handler produces
#[derive(Debug)]
pub enum ResponseBody {
    Full(Full<Bytes>),
    File(FileBody),
}

impl ResponseBody {
    pub fn full(data: impl Into<Bytes>) -> Self {
        Self::Full(Full::new(data.into()))
    }

    pub fn empty() -> Self {
        Self::full(Bytes::new())
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Full(full) => Pin::new(full).poll_frame(cx).map_err(|never| match never {}),
            Self::File(file) => Pin::new(file).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Full(full) => full.is_end_stream(),
            Self::File(file) => file.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Full(full) => full.size_hint(),
            Self::File(file) => file.size_hint(),
        }
    }
}

/// Streams exactly `len` bytes of an open file
///
/// A file that shrinks while it is sent ends the body with
/// `UnexpectedEof`; the status line is already out by then, so hyper drops
/// the connection.
#[derive(Debug)]
pub struct FileBody {
    file: File,
    remaining: u64,
}

impl FileBody {
    pub const fn new(file: File, len: u64) -> Self {
        Self {
            file,
            remaining: len,
        }
    }

    /// Bytes still to be sent
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Body for FileBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.remaining == 0 {
            return Poll::Ready(None);
        }

        // Bounded by CHUNK_SIZE, so the cast cannot truncate
        #[allow(clippy::cast_possible_truncation)]
        let want = this.remaining.min(CHUNK_SIZE) as usize;
        let mut chunk = vec![0; want];
        let mut read_buf = ReadBuf::new(&mut chunk);
        ready!(Pin::new(&mut this.file).poll_read(cx, &mut read_buf))?;

        let filled = read_buf.filled().len();
        if filled == 0 {
            return Poll::Ready(Some(Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file shrank while it was being sent",
            ))));
        }

        this.remaining -= filled as u64;
        chunk.truncate(filled);
        Poll::Ready(Some(Ok(Frame::data(Bytes::from(chunk)))))
    }

    fn is_end_stream(&self) -> bool {
        self.remaining == 0
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining)
    }
}
