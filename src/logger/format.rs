//! Access log format module
//!
//! Supports multiple log formats:
//! - `json` (one object per request, the default)
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - Custom patterns with `$variables`

use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Request start timestamp
    pub time: DateTime<Local>,
    pub request_id: String,
    /// Client address as seen by the socket
    pub remote_addr: String,
    /// Host header
    pub host: String,
    pub method: String,
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// HTTP version (1.0, 1.1)
    pub http_version: String,
    pub status: u16,
    /// Declared request body length
    pub bytes_in: u64,
    /// Response body bytes actually sent
    pub body_bytes: u64,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Time from request start until the body finished or was dropped
    pub duration: Duration,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    time: String,
    request_id: &'a str,
    remote_ip: &'a str,
    host: &'a str,
    method: &'a str,
    uri: String,
    status: u16,
    proto: String,
    user_agent: &'a str,
    duration: String,
    bytes_in: u64,
    bytes_out: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            time: Local::now(),
            request_id: String::new(),
            remote_addr,
            host: String::new(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            bytes_in: 0,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            duration: Duration::ZERO,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn time_local(&self) -> String {
        self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string()
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent"`
    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\"",
            self.format_common(),
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/{}\" {} {}",
            self.remote_addr,
            self.time_local(),
            self.method,
            self.request_uri(),
            self.http_version,
            self.status,
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        let line = JsonLine {
            time: self
                .time
                .with_timezone(&Utc)
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            request_id: &self.request_id,
            remote_ip: &self.remote_addr,
            host: &self.host,
            method: &self.method,
            uri: self.request_uri(),
            status: self.status,
            proto: format!("HTTP/{}", self.http_version),
            user_agent: self.user_agent.as_deref().unwrap_or_default(),
            duration: format!("{:?}", self.duration),
            bytes_in: self.bytes_in,
            bytes_out: self.body_bytes,
        };
        serde_json::to_string(&line).unwrap_or_default()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$remote_addr` - Client address
    /// - `$request_id` - Value of `X-Request-ID`
    /// - `$host` - Host header
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$request` - Full request line ("METHOD /path HTTP/version")
    /// - `$request_method` - HTTP method
    /// - `$request_uri` - Request URI with query string
    /// - `$request_time` - Processing time in seconds (3 decimal places)
    /// - `$status` - Response status code
    /// - `$bytes_in` - Request body length
    /// - `$body_bytes_sent` - Response body bytes sent
    /// - `$http_referer` - Referer header
    /// - `$http_user_agent` - User-Agent header
    fn format_custom(&self, pattern: &str) -> String {
        let request_uri = self.request_uri();
        let request_line = format!("{} {} HTTP/{}", self.method, request_uri, self.http_version);

        // Longer variables first: $request_time, $request_id and friends before $request
        let substitutions: [(&str, String); 14] = [
            ("$remote_addr", self.remote_addr.clone()),
            ("$time_local", self.time_local()),
            ("$time_iso8601", self.time.to_rfc3339()),
            (
                "$request_time",
                format!("{:.3}", self.duration.as_secs_f64()),
            ),
            ("$request_id", self.request_id.clone()),
            ("$request_method", self.method.clone()),
            ("$request_uri", request_uri),
            ("$request", request_line),
            ("$status", self.status.to_string()),
            ("$bytes_in", self.bytes_in.to_string()),
            ("$body_bytes_sent", self.body_bytes.to_string()),
            ("$http_referer", self.referer.clone().unwrap_or_else(dash)),
            ("$http_user_agent", self.user_agent.clone().unwrap_or_else(dash)),
            ("$host", self.host.clone()),
        ];

        substitutions
            .iter()
            .fold(pattern.to_string(), |acc, (var, value)| acc.replace(var, value))
    }
}

fn dash() -> String {
    "-".to_string()
}
