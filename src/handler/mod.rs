//! Request handler module
//!
//! Routing dispatch, per-request middleware and the endpoint handlers.

pub mod data;
pub mod health;
pub mod middleware;
pub mod router;
pub mod whoami;

// Re-export main entry point
pub use router::handle_request;
