//! Streaming response bodies
//!
//! `SourceBody` pulls chunks out of any `Read` implementation on demand, so a
//! response never holds more than one chunk of the payload in memory.

use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Default chunk size for generated payloads
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// How the body treats the source running dry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Stream until the source reports end of stream (chunked encoding)
    UntilEof,
    /// Exactly `limit` bytes are promised; an early end is an error
    Exact,
}

/// Body that streams up to `limit` bytes from a `Read` source
#[derive(Debug)]
pub struct SourceBody<S> {
    source: S,
    remaining: u64,
    chunk_size: usize,
    framing: Framing,
    done: bool,
}

impl<S: Read> SourceBody<S> {
    /// Stream until the source ends or `limit` bytes were produced
    pub fn until_eof(source: S, limit: u64, chunk_size: usize) -> Self {
        Self::new(source, limit, chunk_size, Framing::UntilEof)
    }

    /// Stream exactly `len` bytes
    pub fn exact(source: S, len: u64, chunk_size: usize) -> Self {
        Self::new(source, len, chunk_size, Framing::Exact)
    }

    fn new(source: S, limit: u64, chunk_size: usize, framing: Framing) -> Self {
        Self {
            source,
            remaining: limit,
            chunk_size: chunk_size.max(1),
            framing,
            done: limit == 0,
        }
    }

    /// Size of the next read
    ///
    /// A chunk never stops exactly one byte short of `remaining`; the last two
    /// bytes are always requested together.
    fn next_len(&self) -> usize {
        // bounded by chunk_size, which is a usize
        #[allow(clippy::cast_possible_truncation)]
        let mut len = self.remaining.min(self.chunk_size as u64) as usize;
        if self.remaining - len as u64 == 1 && len > 1 {
            len -= 1;
        }
        len
    }

    fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
        if self.done {
            return None;
        }

        let mut buf = vec![0u8; self.next_len()];
        match self.source.read(&mut buf) {
            Ok(0) => {
                self.done = true;
                match self.framing {
                    Framing::UntilEof => None,
                    Framing::Exact => Some(Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("source ended with {} bytes left to send", self.remaining),
                    ))),
                }
            }
            Ok(n) => {
                buf.truncate(n);
                self.remaining -= n as u64;
                self.done = self.remaining == 0;
                Some(Ok(Bytes::from(buf)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: Read + Unpin> Body for SourceBody<S> {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        // generation is pure computation, every poll is immediately ready
        Poll::Ready(self.get_mut().next_chunk().map(|r| r.map(Frame::data)))
    }

    fn is_end_stream(&self) -> bool {
        self.done
    }

    fn size_hint(&self) -> SizeHint {
        match self.framing {
            Framing::Exact => SizeHint::with_exact(self.remaining),
            Framing::UntilEof => {
                let mut hint = SizeHint::new();
                hint.set_upper(self.remaining);
                hint
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::source::expected_byte;
    use crate::content::ContentSource;
    use http_body_util::BodyExt;
    use std::io::{Seek, SeekFrom};
    use std::num::NonZeroU64;

    fn source(length: u64) -> ContentSource {
        ContentSource::new(NonZeroU64::new(length).unwrap())
    }

    fn expected(length: u64) -> Vec<u8> {
        (0..length).filter_map(|i| expected_byte(length, i)).collect()
    }

    #[tokio::test]
    async fn test_streams_whole_sequence() {
        let body = SourceBody::until_eof(source(1000), 1000, 64);
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), expected(1000).as_slice());
    }

    #[tokio::test]
    async fn test_chunk_boundary_one_short_of_end() {
        // 65 = 64 + 1: a naive 64 byte chunk would land on the upper bound
        let body = SourceBody::until_eof(source(65), 65, 64);
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes.as_ref(), expected(65).as_slice());
    }

    #[tokio::test]
    async fn test_length_one_streams_nothing() {
        let body = SourceBody::until_eof(source(1), 1, 64);
        let bytes = body.collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_exact_sub_range() {
        let mut src = source(300);
        src.seek(SeekFrom::Start(100)).unwrap();
        let body = SourceBody::exact(src, 100, 16);
        assert_eq!(body.size_hint().exact(), Some(100));

        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), &expected(300)[100..200]);
    }

    #[tokio::test]
    async fn test_exact_errors_when_source_runs_dry() {
        let mut src = source(10);
        src.seek(SeekFrom::Start(9)).unwrap();
        let body = SourceBody::exact(src, 1, 16);
        assert!(body.collect().await.is_err());
    }

    #[test]
    fn test_next_len() {
        assert_eq!(SourceBody::until_eof(source(10), 10, 4).next_len(), 4);
        assert_eq!(SourceBody::until_eof(source(5), 5, 4).next_len(), 3);
        assert_eq!(SourceBody::until_eof(source(2), 2, 4).next_len(), 2);
        assert_eq!(SourceBody::until_eof(source(2), 1, 4).next_len(), 1);
    }
}
