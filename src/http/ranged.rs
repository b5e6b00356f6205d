//! Range-capable transfer over seekable sources
//!
//! Negotiates a single byte range against any `Read + Seek` source of known
//! size, seeks to the requested offset and streams exactly the covered bytes.

use super::body::SourceBody;
use super::range::{parse_range_header, RangeParseResult};
use super::{build_416_response, empty, ResponseBody};
use http_body_util::BodyExt;
use hyper::{Response, StatusCode};
use std::io::{self, Read, Seek, SeekFrom};

/// Per-response options for `serve_ranged`
#[derive(Debug, Clone, Copy)]
pub struct RangedOptions<'a> {
    /// Value of the client's Range header
    pub range_header: Option<&'a str>,
    /// Send headers only
    pub is_head: bool,
    pub content_type: &'a str,
    pub chunk_size: usize,
}

/// Serve `source` honoring a byte range request
///
/// - satisfiable single range: 206 with `Content-Range`
/// - unsatisfiable range: 416
/// - anything else: 200 streaming the whole source
///
/// Seek failures are returned to the caller before any header is sent.
pub fn serve_ranged<S>(
    mut source: S,
    total: u64,
    options: RangedOptions<'_>,
) -> io::Result<Response<ResponseBody>>
where
    S: Read + Seek + Send + Sync + Unpin + 'static,
{
    match parse_range_header(options.range_header, total) {
        RangeParseResult::Valid(range) => {
            let end = range.end_position(total);
            let len = range.content_length(total);
            source.seek(SeekFrom::Start(range.start))?;

            let body = if options.is_head {
                empty()
            } else {
                SourceBody::exact(source, len, options.chunk_size).boxed()
            };

            Ok(Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header("Content-Type", options.content_type)
                .header("Content-Length", len)
                .header("Content-Range", format!("bytes {}-{end}/{total}", range.start))
                .header("Accept-Ranges", "bytes")
                .body(body)
                .unwrap_or_else(|e| {
                    crate::logger::log_error(&format!("Failed to build 206 response: {e}"));
                    Response::new(empty())
                }))
        }
        RangeParseResult::NotSatisfiable => Ok(build_416_response(total)),
        RangeParseResult::None => {
            source.seek(SeekFrom::Start(0))?;

            let body = if options.is_head {
                empty()
            } else {
                SourceBody::until_eof(source, total, options.chunk_size).boxed()
            };

            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", options.content_type)
                .header("Accept-Ranges", "bytes")
                .body(body)
                .unwrap_or_else(|e| {
                    crate::logger::log_error(&format!("Failed to build 200 response: {e}"));
                    Response::new(empty())
                }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn options(range_header: Option<&str>) -> RangedOptions<'_> {
        RangedOptions {
            range_header,
            is_head: false,
            content_type: "text/plain",
            chunk_size: 8,
        }
    }

    async fn body_bytes(resp: Response<ResponseBody>) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_partial_content() {
        let data: Vec<u8> = (0u8..100).collect();
        let resp = serve_ranged(Cursor::new(data.clone()), 100, options(Some("bytes=10-29"))).unwrap();

        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()["content-range"], "bytes 10-29/100");
        assert_eq!(resp.headers()["content-length"], "20");
        assert_eq!(body_bytes(resp).await, &data[10..30]);
    }

    #[tokio::test]
    async fn test_full_content_without_range() {
        let data: Vec<u8> = (0u8..50).collect();
        let mut cursor = Cursor::new(data.clone());
        cursor.set_position(20);

        let resp = serve_ranged(cursor, 50, options(None)).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["accept-ranges"], "bytes");
        assert_eq!(body_bytes(resp).await, data);
    }

    #[tokio::test]
    async fn test_multi_range_falls_back_to_full() {
        let data = vec![7u8; 40];
        let resp = serve_ranged(Cursor::new(data), 40, options(Some("bytes=0-1,5-6"))).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsatisfiable() {
        let resp = serve_ranged(Cursor::new(vec![0u8; 10]), 10, options(Some("bytes=10-"))).unwrap();
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()["content-range"], "bytes */10");
    }

    #[tokio::test]
    async fn test_head_sends_headers_only() {
        let mut opts = options(Some("bytes=0-4"));
        opts.is_head = true;
        let resp = serve_ranged(Cursor::new(vec![1u8; 10]), 10, opts).unwrap();
        assert_eq!(resp.headers()["content-length"], "5");
        assert!(body_bytes(resp).await.is_empty());
    }
}
