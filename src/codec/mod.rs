//! Payload decoding subsystem.
//!
//! # Data Flow
//! ```text
//! data_source = body:
//!     Content-Encoding: gzip   → body.rs (streaming inflate into a capped buffer)
//!     Content-Encoding: snappy → body.rs (bounded read, block decode)
//!     otherwise                → body.rs (bounded read)
//!
//! data_source = query:
//!     raw query string → query.rs (strict percent-decoding)
//! ```
//!
//! # Design Decisions
//! - The decoded buffer never grows past the configured max body size
//! - Size violations and malformed input are distinct errors (413 vs 400)

pub mod body;
pub mod query;

use thiserror::Error;

use crate::error::ProtocolError;

pub use body::{decode_body, ContentEncoding};
pub use query::decode_query;

/// Failure while turning a request into a decoded payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("reading body failed: {0}")]
    Read(String),

    #[error("body not received within {0:?}")]
    ReadTimeout(std::time::Duration),

    #[error("gzip: {0}")]
    Gzip(std::io::Error),

    #[error("snappy: {0}")]
    Snappy(#[from] snap::Error),

    #[error("invalid escape at offset {0}")]
    Escape(usize),
}

impl From<DecodeError> for ProtocolError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::TooLarge { .. } => ProtocolError::TooLarge,
            other => ProtocolError::BadRequest(other.to_string()),
        }
    }
}
