//! Diagnostic HTTP service
//!
//! Reports request and host details, serves deterministic synthetic payloads
//! of any size with byte-range support, and exposes a toggleable health
//! status and Prometheus metrics.

pub mod cli;
pub mod config;
pub mod content;
pub mod handler;
pub mod health;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod server;
