//! Synthetic content engine
//!
//! Size resolution and the deterministic, seekable byte source behind `/data`.

mod error;
pub mod size;
pub mod source;

pub use error::ContentError;
pub use size::resolve;
pub use source::{ContentSource, ReadOutcome, SeekableContent, ALPHABET, BOUNDARY};
