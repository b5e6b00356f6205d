// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub data: DataConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level: debug, info, warn, error
    pub level: String,
    /// Application log format: text or json
    pub format: String,
    pub access_log: bool,
    /// Access log format (json, combined, common, or custom pattern)
    pub access_log_format: String,
    /// Path prefixes excluded from the access log
    #[serde(default)]
    pub access_log_skip_paths: Vec<String>,
    /// Access log file path (optional, stdout if not set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            access_log: false,
            access_log_format: "json".to_string(),
            access_log_skip_paths: Vec::new(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration, timeouts in seconds (0 disables)
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PerformanceConfig {
    pub read_header_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub keep_alive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            read_header_timeout: 0,
            read_timeout: 0,
            write_timeout: 0,
            keep_alive: true,
            max_connections: None,
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Largest request body read by handlers that consume one
    pub max_body_size: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10_485_760, // 10MB
        }
    }
}

/// Synthetic payload configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DataConfig {
    /// Bytes generated per body frame
    pub chunk_size: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::http::body::DEFAULT_CHUNK_SIZE,
        }
    }
}
