//! Content engine error types

use hyper::StatusCode;
use std::num::ParseIntError;
use thiserror::Error;

/// Errors raised while resolving a payload size or positioning a source
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("invalid size: {0}")]
    InvalidSize(#[from] ParseIntError),

    #[error("size cannot be 0")]
    ZeroSize,

    #[error("size too large: {size} {unit} overflows 64 bits")]
    SizeTooLarge { size: u64, unit: String },

    #[error("seek: invalid offset {0}")]
    InvalidSeek(i128),
}

impl ContentError {
    /// HTTP status this error surfaces as
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidSize(_) | Self::ZeroSize | Self::SizeTooLarge { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidSeek(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ContentError> for std::io::Error {
    fn from(err: ContentError) -> Self {
        Self::new(std::io::ErrorKind::InvalidInput, err)
    }
}
