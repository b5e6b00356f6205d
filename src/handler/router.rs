//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: request id, route matching,
//! dispatch, metrics and the access log.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, StatusCode};

use super::{data, health, middleware, whoami};
use crate::config::AppState;
use crate::http::{self, deadline_after, DeadlineBody, ResponseBody};
use crate::logger;

/// Request head plus the values every handler needs
pub struct RequestContext {
    pub parts: Parts,
    pub peer_addr: SocketAddr,
    pub request_id: String,
    /// Decoded query pairs in request order
    pub query: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(parts: Parts, peer_addr: SocketAddr, request_id: String) -> Self {
        let query = parts
            .uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self {
            parts,
            peer_addr,
            request_id,
            query,
        }
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub const fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn is_head(&self) -> bool {
        self.parts.method == Method::HEAD
    }

    /// First value of a query parameter
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the query names `key`, with or without a value
    pub fn has_param(&self, key: &str) -> bool {
        self.query.iter().any(|(k, _)| k == key)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Host header, falling back to the URI authority
    pub fn host(&self) -> &str {
        self.header("host")
            .or_else(|| self.parts.uri.authority().map(hyper::http::uri::Authority::as_str))
            .unwrap_or_default()
    }
}

/// Routes served by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Metrics,
    Health,
    Data,
    Api,
    Whoami,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        match path {
            "/metrics" => Self::Metrics,
            "/health" => Self::Health,
            "/data" => Self::Data,
            "/api" => Self::Api,
            p if p.starts_with("/api/") => Self::Api,
            _ => Self::Whoami,
        }
    }

    /// Handler label used in metrics
    pub const fn name(self) -> &'static str {
        match self {
            Self::Metrics => "/metrics",
            Self::Health => "/health",
            Self::Data => "/data",
            Self::Api => "/api",
            Self::Whoami => "/",
        }
    }
}

/// Main entry point for HTTP request handling
///
/// `read_timeout` bounds reading the request body and `write_timeout` bounds
/// handling plus sending the response, both counted from the moment the
/// request head arrived. A handler that overruns the write timeout produces
/// no response; the error makes hyper close the connection.
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, io::Error>
where
    B: Body + Unpin,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = tokio::time::Instant::now();
    let perf = &state.config.performance;
    let read_deadline = deadline_after(started, perf.read_timeout);
    let write_deadline = deadline_after(started, perf.write_timeout);

    let (mut parts, body) = req.into_parts();
    let request_id = middleware::ensure_request_id(&mut parts.headers);
    let route = Route::from_path(parts.uri.path());
    let ctx = RequestContext::new(parts, peer_addr, request_id);
    let body = DeadlineBody::new(body, read_deadline, "read");

    let mut response = {
        let _inflight = state.metrics.track_inflight(route.name());
        let dispatched = dispatch(route, &ctx, body, &state);
        match write_deadline {
            Some(at) => tokio::time::timeout_at(at, dispatched).await.map_err(|_| {
                logger::log_warning(&format!(
                    "{} {} [{}] exceeded the write timeout",
                    ctx.method(),
                    ctx.path(),
                    ctx.request_id
                ));
                io::Error::new(io::ErrorKind::TimedOut, "write timeout exceeded")
            })?,
            None => dispatched.await,
        }
    };

    state.metrics.observe(
        route.name(),
        ctx.method().as_str(),
        response.status().as_u16(),
        started.elapsed(),
    );

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response
            .headers_mut()
            .insert(middleware::REQUEST_ID_HEADER, value);
    }

    if write_deadline.is_some() {
        response = response.map(|body| DeadlineBody::new(body, write_deadline, "write").boxed());
    }

    Ok(middleware::with_access_log(
        response,
        &ctx,
        started.into_std(),
        &state.config.logging,
    ))
}

async fn dispatch<B>(
    route: Route,
    ctx: &RequestContext,
    body: B,
    state: &AppState,
) -> Response<ResponseBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match route {
        Route::Metrics => serve_metrics(state),
        Route::Health => health::serve(ctx, body, state).await,
        Route::Data => data::serve(ctx, state),
        Route::Api => whoami::serve(ctx, whoami::ReportFormat::Json).await,
        Route::Whoami => whoami::serve(ctx, whoami::ReportFormat::Text).await,
    }
}

fn serve_metrics(state: &AppState) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")
        .body(http::full(state.metrics.render()))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build metrics response: {e}"));
            Response::new(http::empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::Empty;
    use hyper::body::Bytes;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::default()))
    }

    fn peer() -> SocketAddr {
        "10.0.0.7:40000".parse().unwrap()
    }

    fn get(uri: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .uri(uri)
            .header("host", "whoami.test")
            .body(Empty::new())
            .unwrap()
    }

    #[test]
    fn test_route_from_path() {
        assert_eq!(Route::from_path("/metrics"), Route::Metrics);
        assert_eq!(Route::from_path("/health"), Route::Health);
        assert_eq!(Route::from_path("/data"), Route::Data);
        assert_eq!(Route::from_path("/api"), Route::Api);
        assert_eq!(Route::from_path("/api/users/1"), Route::Api);
        assert_eq!(Route::from_path("/apiary"), Route::Whoami);
        assert_eq!(Route::from_path("/data/x"), Route::Whoami);
        assert_eq!(Route::from_path("/"), Route::Whoami);
    }

    #[test]
    fn test_query_helpers() {
        let (parts, ()) = Request::builder()
            .uri("/data?size=5&attachment&size=7&name=a%20b")
            .body(())
            .unwrap()
            .into_parts();
        let ctx = RequestContext::new(parts, peer(), "id".to_string());
        assert_eq!(ctx.query_param("size"), Some("5"));
        assert_eq!(ctx.query_param("name"), Some("a b"));
        assert!(ctx.has_param("attachment"));
        assert_eq!(ctx.query_param("attachment"), Some(""));
        assert!(!ctx.has_param("unit"));
    }

    #[tokio::test]
    async fn test_request_id_echoed() {
        let mut req = get("/data?size=4");
        req.headers_mut()
            .insert("x-request-id", HeaderValue::from_static("fixed-id"));
        let resp = handle_request(req, peer(), state()).await.unwrap();
        assert_eq!(resp.headers()["x-request-id"], "fixed-id");
    }

    #[tokio::test]
    async fn test_handler_overrunning_write_timeout_gets_no_response() {
        let mut config = Config::default();
        config.performance.write_timeout = 1;
        let state = Arc::new(AppState::new(config));

        let err = handle_request(get("/?delay=1500ms"), peer(), Arc::clone(&state))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);

        // the deadline belongs to the request, a fresh one starts over
        let resp = handle_request(get("/?delay=200ms"), peer(), state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(body.starts_with(b"RequestID: "));
    }

    #[tokio::test]
    async fn test_metrics_recorded() {
        let state = state();
        let resp = handle_request(get("/data?size=0"), peer(), Arc::clone(&state))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = handle_request(get("/metrics"), peer(), Arc::clone(&state))
            .await
            .unwrap();
        let text = resp.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(text.to_vec()).unwrap();
        assert!(text.contains(
            "whoami_http_requests_total{code=\"400\",handler=\"/data\",method=\"GET\"} 1"
        ));
        assert!(text.contains("whoami_http_requests_inflight{handler=\"/metrics\"} 1"));
    }
}
