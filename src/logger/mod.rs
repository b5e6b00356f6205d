//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Leveled application logging in text or JSON form
//! - Access logging with multiple formats
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use chrono::Local;

use crate::config::Config;

static LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static JSON: AtomicBool = AtomicBool::new(false);

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    fn current() -> Self {
        match LEVEL.load(Ordering::Relaxed) {
            0 => Self::Debug,
            1 => Self::Info,
            2 => Self::Warn,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown log level: {other} (expected debug, info, warn or error)"
            )),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level: Level = config
        .logging
        .level
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    LEVEL.store(level as u8, Ordering::Relaxed);
    JSON.store(config.logging.format == "json", Ordering::Relaxed);

    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn render(level: Level, message: &str, json: bool) -> String {
    let time = Local::now();
    if json {
        serde_json::json!({
            "time": time.to_rfc3339(),
            "level": level.as_str(),
            "msg": message,
        })
        .to_string()
    } else {
        format!("{} [{level}] {message}", time.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

fn log(level: Level, message: &str) {
    if level < Level::current() {
        return;
    }
    let line = render(level, message, JSON.load(Ordering::Relaxed));
    match writer::get() {
        Some(w) => w.write_app(&line),
        None => eprintln!("{line}"),
    }
}

pub fn log_debug(message: &str) {
    log(Level::Debug, message);
}

pub fn log_info(message: &str) {
    log(Level::Info, message);
}

pub fn log_warning(message: &str) {
    log(Level::Warn, message);
}

pub fn log_error(message: &str) {
    log(Level::Error, message);
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    log_info(&format!("listening on http://{addr}"));
    if let Some(workers) = config.server.workers {
        log_info(&format!("worker threads: {workers}"));
    }
    if config.logging.access_log {
        log_info(&format!(
            "access log: {} ({})",
            config.logging.access_log_file.as_deref().unwrap_or("stdout"),
            config.logging.access_log_format
        ));
    }
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &impl fmt::Display) {
    log_warning(&format!("connection {peer_addr}: {err}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}
