//! Request and host report
//!
//! Served as text on `/` and as JSON on `/api`.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::router::RequestContext;
use crate::http::{build_error_response, build_json_response, build_text_response, ResponseBody};
use crate::logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Everything the server knows about a request and itself
#[derive(Debug, Serialize)]
pub struct Report {
    pub request_id: String,
    pub hostname: String,
    pub ip: Vec<String>,
    pub host: String,
    pub url: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Vec<String>>,
    pub method: String,
    pub proto: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
    pub user_agent: String,
    pub remote_addr: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl Report {
    pub fn collect(ctx: &RequestContext) -> std::io::Result<Self> {
        let hostname = hostname::get()?.to_string_lossy().into_owned();

        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in &ctx.query {
            params.entry(key.clone()).or_default().push(value.clone());
        }

        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in &ctx.parts.headers {
            if *name == hyper::header::HOST {
                continue;
            }
            headers
                .entry(canonical_header_name(name.as_str()))
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let remote_addr = ctx
            .header("x-forwarded-for")
            .filter(|v| !v.is_empty())
            .map_or_else(|| ctx.peer_addr.to_string(), ToString::to_string);

        let environment = if ctx.has_param("env") {
            std::env::vars_os()
                .map(|(k, v)| {
                    (
                        k.to_string_lossy().into_owned(),
                        v.to_string_lossy().into_owned(),
                    )
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            request_id: ctx.request_id.clone(),
            hostname,
            ip: local_ipv4_addrs(),
            host: ctx.host().to_string(),
            url: ctx
                .parts
                .uri
                .path_and_query()
                .map_or_else(|| ctx.path().to_string(), ToString::to_string),
            params,
            method: ctx.method().to_string(),
            proto: format!("{:?}", ctx.parts.version),
            headers,
            user_agent: ctx.header("user-agent").unwrap_or_default().to_string(),
            remote_addr,
            environment,
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RequestID: {}", self.request_id)?;
        writeln!(f, "Hostname: {}", self.hostname)?;
        for ip in &self.ip {
            writeln!(f, "IP: {ip}")?;
        }
        writeln!(f, "Host: {}", self.host)?;
        writeln!(f, "URL: {}", self.url)?;
        writeln!(f, "Method: {}", self.method)?;
        writeln!(f, "Proto: {}", self.proto)?;
        for (key, values) in &self.params {
            for value in values {
                writeln!(f, "Param: {key}={value}")?;
            }
        }
        for (name, values) in &self.headers {
            for value in values {
                writeln!(f, "Header: {name}: {value}")?;
            }
        }
        writeln!(f, "UserAgent: {}", self.user_agent)?;
        writeln!(f, "RemoteAddr: {}", self.remote_addr)?;
        for (key, value) in &self.environment {
            writeln!(f, "Env: {key}={value}")?;
        }
        Ok(())
    }
}

pub async fn serve(ctx: &RequestContext, format: ReportFormat) -> Response<ResponseBody> {
    if ctx.has_param("delay") {
        match parse_duration(ctx.query_param("delay").unwrap_or_default()) {
            Ok(delay) => tokio::time::sleep(delay).await,
            Err(msg) => return build_error_response(StatusCode::BAD_REQUEST, &msg),
        }
    }

    let report = match Report::collect(ctx) {
        Ok(report) => report,
        Err(e) => {
            logger::log_error(&format!("hostname lookup failed: {e}"));
            return build_error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    match format {
        ReportFormat::Json => build_json_response(StatusCode::OK, &report),
        ReportFormat::Text => build_text_response(report.to_string(), ctx.is_head()),
    }
}

/// Non-loopback IPv4 addresses of this host
fn local_ipv4_addrs() -> Vec<String> {
    if_addrs::get_if_addrs()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|iface| match iface.ip() {
            IpAddr::V4(v4) if !v4.is_loopback() => Some(v4.to_string()),
            _ => None,
        })
        .collect()
}

/// `x-request-id` -> `X-Request-Id`
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
            })
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Parse a duration such as `300ms`, `1.5s` or `1m30s`
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` needs no
/// unit. Negative durations are accepted and mean no delay.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use whoami::handler::whoami::parse_duration;
///
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("1.5ms").unwrap(), Duration::from_micros(1500));
/// assert!(parse_duration("10").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let invalid = || format!("time: invalid duration \"{input}\"");

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut nanos = 0f64;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_end];
        if number.is_empty() || number == "." {
            return Err(invalid());
        }
        let value: f64 = number.parse().map_err(|_| invalid())?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "\u{b5}s" | "\u{3bc}s" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("time: missing unit in duration \"{input}\"")),
            unit => {
                return Err(format!(
                    "time: unknown unit \"{unit}\" in duration \"{input}\""
                ))
            }
        };
        nanos += value * scale;
        rest = &rest[unit_end..];
    }

    if negative {
        return Ok(Duration::ZERO);
    }
    // saturating float to int conversion
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(Duration::from_nanos(nanos.round() as u64))
}
