//! HTTP protocol layer module
//!
//! Response bodies, builders and range negotiation, decoupled from the
//! handlers that use them.

pub mod body;
pub mod deadline;
pub mod range;
pub mod ranged;
pub mod response;

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;

// Re-export commonly used types
pub use body::SourceBody;
pub use deadline::{deadline_after, DeadlineBody};
pub use range::parse_range_header;
pub use ranged::{serve_ranged, RangedOptions};
pub use response::{
    build_405_response, build_413_response, build_416_response, build_accepted_response,
    build_error_response, build_health_response, build_json_response, build_text_response,
};

/// Body type of every response the server produces
pub type ResponseBody = BoxBody<Bytes, std::io::Error>;

/// Whole body from in-memory data
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

/// Body with no data
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}
