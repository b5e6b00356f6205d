//! Synthetic payload delivery for `/data`
//!
//! `size` and `unit` pick the byte count. Without `attachment` the payload is
//! streamed with chunked encoding; with it, the response is a downloadable
//! `data.txt` that honors byte ranges.

use chrono::Utc;
use http_body_util::BodyExt;
use hyper::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE, LAST_MODIFIED};
use hyper::{Method, Response, StatusCode};

use super::router::RequestContext;
use crate::config::AppState;
use crate::content::{self, ContentSource, SeekableContent};
use crate::http::{
    build_405_response, build_error_response, empty, serve_ranged, RangedOptions, ResponseBody,
    SourceBody,
};
use crate::logger;

const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
const ATTACHMENT: &str = "attachment; filename=\"data.txt\"";

pub fn serve(ctx: &RequestContext, state: &AppState) -> Response<ResponseBody> {
    if !matches!(*ctx.method(), Method::GET | Method::HEAD) {
        return build_405_response("GET, HEAD");
    }

    let length = match content::resolve(ctx.query_param("size"), ctx.query_param("unit")) {
        Ok(length) => length,
        Err(e) => {
            logger::log_debug(&format!("rejected /data request: {e}"));
            return build_error_response(e.status(), &e.to_string());
        }
    };

    let source = ContentSource::new(length);
    let chunk_size = state.config.data.chunk_size;

    if ctx.has_param("attachment") {
        serve_attachment(ctx, source, chunk_size)
    } else {
        serve_stream(ctx, source, chunk_size)
    }
}

fn serve_stream(
    ctx: &RequestContext,
    source: ContentSource,
    chunk_size: usize,
) -> Response<ResponseBody> {
    let body = if ctx.is_head() {
        empty()
    } else {
        let length = source.length();
        SourceBody::until_eof(source, length, chunk_size).boxed()
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, CONTENT_TYPE_TEXT)
        .body(body)
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build 200 response: {e}"));
            Response::new(empty())
        })
}

fn serve_attachment(
    ctx: &RequestContext,
    source: ContentSource,
    chunk_size: usize,
) -> Response<ResponseBody> {
    let source = SeekableContent::new(source);
    let total = source.delivered_len();
    let options = RangedOptions {
        range_header: ctx.header("range"),
        is_head: ctx.is_head(),
        content_type: CONTENT_TYPE_TEXT,
        chunk_size,
    };

    let mut response = match serve_ranged(source, total, options) {
        Ok(response) => response,
        Err(e) => {
            logger::log_error(&format!("seek failed for /data: {e}"));
            return build_error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    let headers = response.headers_mut();
    headers.insert(CONTENT_DISPOSITION, HeaderValue::from_static(ATTACHMENT));
    let modified = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
    if let Ok(value) = HeaderValue::from_str(&modified) {
        headers.insert(LAST_MODIFIED, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::content::source::expected_byte;
    use crate::content::BOUNDARY;
    use hyper::Request;

    fn ctx(method: Method, uri: &str, range: Option<&str>) -> RequestContext {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(range) = range {
            builder = builder.header("range", range);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        RequestContext::new(parts, "127.0.0.1:1".parse().unwrap(), "id".to_string())
    }

    fn state() -> AppState {
        let mut config = Config::default();
        config.data.chunk_size = 100;
        AppState::new(config)
    }

    async fn body(resp: Response<ResponseBody>) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_stream_exact_size() {
        for n in [2u64, 27, 28, 99, 100, 101, 1000] {
            let uri = format!("/data?size={n}");
            let resp = serve(&ctx(Method::GET, &uri, None), &state());
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(resp.headers().get("content-length").is_none());

            let data = body(resp).await;
            assert_eq!(data.len() as u64, n, "size {n}");
            assert_eq!(data[0], BOUNDARY);
            assert_eq!(data[data.len() - 1], BOUNDARY);
            for (i, byte) in data.iter().enumerate() {
                assert_eq!(Some(*byte), expected_byte(n, i as u64), "size {n} offset {i}");
            }
        }
    }

    #[tokio::test]
    async fn test_negative_size_and_units() {
        let data = body(serve(&ctx(Method::GET, "/data?size=-10", None), &state())).await;
        assert_eq!(data.len(), 10);

        let data = body(serve(&ctx(Method::GET, "/data?size=2&unit=KB", None), &state())).await;
        assert_eq!(data.len(), 2048);
    }

    #[tokio::test]
    async fn test_size_errors() {
        let resp = serve(&ctx(Method::GET, "/data?size=0", None), &state());
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(resp).await, b"size cannot be 0\n");

        let resp = serve(&ctx(Method::GET, "/data?size=abc", None), &state());
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = serve(&ctx(Method::GET, "/data?size=99999999&unit=tb", None), &state());
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let resp = serve(&ctx(Method::POST, "/data", None), &state());
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["allow"], "GET, HEAD");
    }

    #[tokio::test]
    async fn test_attachment_full() {
        let resp = serve(&ctx(Method::GET, "/data?size=300&attachment", None), &state());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-disposition"], ATTACHMENT);
        assert_eq!(resp.headers()["accept-ranges"], "bytes");
        assert!(resp.headers().contains_key("last-modified"));
        assert_eq!(body(resp).await.len(), 300);
    }

    #[tokio::test]
    async fn test_attachment_range() {
        let resp = serve(
            &ctx(Method::GET, "/data?size=300&attachment", Some("bytes=100-199")),
            &state(),
        );
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()["content-range"], "bytes 100-199/300");
        assert_eq!(resp.headers()["content-length"], "100");

        let data = body(resp).await;
        assert_eq!(data.len(), 100);
        for (i, byte) in data.iter().enumerate() {
            assert_eq!(Some(*byte), expected_byte(300, 100 + i as u64));
        }
    }

    async fn range_body(range: &str) -> (StatusCode, hyper::HeaderMap, Vec<u8>) {
        let resp = serve(
            &ctx(Method::GET, "/data?size=300&attachment", Some(range)),
            &state(),
        );
        let status = resp.status();
        let headers = resp.headers().clone();
        (status, headers, body(resp).await)
    }

    #[tokio::test]
    async fn test_every_range_shape_matches_full_body() {
        let full = body(serve(&ctx(Method::GET, "/data?size=300&attachment", None), &state())).await;
        assert_eq!(full.len(), 300);

        let cases: [(&str, usize, usize); 9] = [
            ("bytes=0-299", 0, 299),
            ("bytes=0-0", 0, 0),
            ("bytes=250-298", 250, 298),
            ("bytes=298-298", 298, 298),
            ("bytes=299-", 299, 299),
            ("bytes=-1", 299, 299),
            ("bytes=-2", 298, 299),
            ("bytes=-150", 150, 299),
            ("bytes=101-", 101, 299),
        ];
        for (range, start, end) in cases {
            let (status, headers, data) = range_body(range).await;
            assert_eq!(status, StatusCode::PARTIAL_CONTENT, "{range}");
            assert_eq!(
                headers["content-range"],
                format!("bytes {start}-{end}/300").as_str(),
                "{range}"
            );
            assert_eq!(data.as_slice(), &full[start..=end], "{range}");
        }
    }

    #[tokio::test]
    async fn test_length_one_attachment() {
        let resp = serve(&ctx(Method::GET, "/data?size=1&attachment", None), &state());
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body(resp).await.is_empty());

        let resp = serve(
            &ctx(Method::GET, "/data?size=1&attachment", Some("bytes=0-0")),
            &state(),
        );
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()["content-range"], "bytes */0");
    }

    #[tokio::test]
    async fn test_attachment_unsatisfiable() {
        let resp = serve(
            &ctx(Method::GET, "/data?size=300&attachment", Some("bytes=500-600")),
            &state(),
        );
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()["content-range"], "bytes */300");
    }

    #[tokio::test]
    async fn test_multi_range_falls_back() {
        let resp = serve(
            &ctx(Method::GET, "/data?size=300&attachment", Some("bytes=0-9,20-29")),
            &state(),
        );
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await.len(), 300);
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let resp = serve(&ctx(Method::HEAD, "/data?size=50", None), &state());
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body(resp).await.is_empty());
    }
}
