//! Per-request middleware
//!
//! Request id propagation and the access log, which is written once the
//! response body has been fully sent or dropped.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes, Frame, SizeHint};
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::Response;
use uuid::Uuid;

use super::router::RequestContext;
use crate::config::LoggingConfig;
use crate::http::ResponseBody;
use crate::logger::{self, AccessLogEntry};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Return the request id, generating and inserting a UUID v4 when the
/// client did not send one
pub fn ensure_request_id(headers: &mut HeaderMap) -> String {
    if let Some(id) = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return id.to_string();
    }

    let id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&id) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    id
}

/// Whether a request to `path` gets an access log line
pub fn should_log(path: &str, logging: &LoggingConfig) -> bool {
    logging.access_log
        && !logging
            .access_log_skip_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
}

/// Wrap the response body so an access log line is emitted when it is done
pub fn with_access_log(
    response: Response<ResponseBody>,
    ctx: &RequestContext,
    started: Instant,
    logging: &LoggingConfig,
) -> Response<ResponseBody> {
    if !should_log(ctx.path(), logging) {
        return response;
    }

    let mut entry = AccessLogEntry::new(
        ctx.peer_addr.to_string(),
        ctx.method().to_string(),
        ctx.path().to_string(),
    );
    entry.request_id.clone_from(&ctx.request_id);
    entry.host = ctx.host().to_string();
    entry.query = ctx.parts.uri.query().map(ToString::to_string);
    entry.http_version = match ctx.parts.version {
        hyper::Version::HTTP_10 => "1.0".to_string(),
        _ => "1.1".to_string(),
    };
    entry.status = response.status().as_u16();
    entry.bytes_in = ctx
        .header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    entry.referer = ctx.header("referer").map(ToString::to_string);
    entry.user_agent = ctx.header("user-agent").map(ToString::to_string);

    let format = logging.access_log_format.clone();
    response.map(|inner| {
        AccessLogBody {
            inner,
            entry,
            format,
            started,
        }
        .boxed()
    })
}

/// Body wrapper counting the bytes that actually went out
struct AccessLogBody {
    inner: ResponseBody,
    entry: AccessLogEntry,
    format: String,
    started: Instant,
}

impl Body for AccessLogBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let poll = Pin::new(&mut self.inner).poll_frame(cx);
        if let Poll::Ready(Some(Ok(frame))) = &poll {
            if let Some(data) = frame.data_ref() {
                self.entry.body_bytes += data.len() as u64;
            }
        }
        poll
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for AccessLogBody {
    fn drop(&mut self) {
        self.entry.duration = self.started.elapsed();
        logger::log_access(&self.entry, &self.format);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_generated() {
        let mut headers = HeaderMap::new();
        let id = ensure_request_id(&mut headers);
        assert_eq!(id.len(), 36);
        assert_eq!(headers[REQUEST_ID_HEADER], id.as_str());
    }

    #[test]
    fn test_request_id_reused() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("trace-42"));
        assert_eq!(ensure_request_id(&mut headers), "trace-42");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_skip_paths() {
        let mut logging = LoggingConfig {
            access_log: true,
            access_log_skip_paths: vec!["/health".to_string(), "/metrics".to_string()],
            ..LoggingConfig::default()
        };
        assert!(should_log("/data", &logging));
        assert!(!should_log("/health", &logging));
        assert!(!should_log("/metrics/extra", &logging));

        logging.access_log = false;
        assert!(!should_log("/data", &logging));
    }
}
