//! `/health` endpoint
//!
//! GET reports the stored status code, POST replaces it.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Method, Response, StatusCode};

use super::router::RequestContext;
use crate::config::AppState;
use crate::http::{
    build_405_response, build_413_response, build_accepted_response, build_error_response,
    build_health_response, ResponseBody,
};
use crate::logger;

pub async fn serve<B>(ctx: &RequestContext, body: B, state: &AppState) -> Response<ResponseBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match *ctx.method() {
        Method::GET | Method::HEAD => build_health_response(state.health.get()),
        Method::POST => update(body, state).await,
        _ => build_405_response("GET, HEAD, POST"),
    }
}

async fn update<B>(body: B, state: &AppState) -> Response<ResponseBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(state.config.http.max_body_size).unwrap_or(usize::MAX);
    let payload = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return build_413_response();
        }
        Err(e)
            if e
                .downcast_ref::<std::io::Error>()
                .is_some_and(|e| e.kind() == std::io::ErrorKind::TimedOut) =>
        {
            return build_error_response(StatusCode::REQUEST_TIMEOUT, &e.to_string());
        }
        Err(e) => {
            return build_error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    let text = String::from_utf8_lossy(&payload);
    let text = text.trim();
    if text.is_empty() {
        return build_error_response(StatusCode::BAD_REQUEST, "post request payload required");
    }

    let code: i64 = match text.parse() {
        Ok(code) => code,
        Err(e) => {
            return build_error_response(
                StatusCode::BAD_REQUEST,
                &format!("invalid status code {text:?}: {e}"),
            );
        }
    };

    let stored = u16::try_from(code)
        .map_err(|_| format!("invalid status code: {code}"))
        .and_then(|code| state.health.set(code));
    if let Err(msg) = stored {
        return build_error_response(StatusCode::BAD_REQUEST, &msg);
    }

    logger::log_info(&format!("health status set to {code}"));
    build_accepted_response()
}
