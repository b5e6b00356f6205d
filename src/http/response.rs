//! HTTP response building module
//!
//! Builders for the status code responses shared by all handlers.

use super::{empty, full, ResponseBody};
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Build plain text error response, body terminated by a newline
pub fn build_error_response(status: StatusCode, message: &str) -> Response<ResponseBody> {
    let body = format!("{message}\n");
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("X-Content-Type-Options", "nosniff")
        .body(full(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(empty())
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Allow", allow)
        .body(full("405 Method Not Allowed\n"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(empty())
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<ResponseBody> {
    build_error_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(total: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Range", format!("bytes */{total}"))
        .body(full("416 Range Not Satisfiable\n"))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(empty())
        })
}

/// Build plain text 200 response
pub fn build_text_response(text: String, is_head: bool) -> Response<ResponseBody> {
    let content_length = text.len();
    let body = if is_head { empty() } else { full(text) };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", content_length)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(empty())
        })
}

/// Build JSON response from any serializable value
pub fn build_json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<ResponseBody> {
    let json = match serde_json::to_vec(value) {
        Ok(mut j) => {
            j.push(b'\n');
            j
        }
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(full(json))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(empty())
        })
}

/// Build health status response, the stored code doubles as the HTTP status
pub fn build_health_response(code: u16) -> Response<ResponseBody> {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(full(format!(r#"{{"status":{code}}}"#)))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(empty())
        })
}

/// Build 202 Accepted response with no body
pub fn build_accepted_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::ACCEPTED)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("202", &e);
            Response::new(empty())
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
