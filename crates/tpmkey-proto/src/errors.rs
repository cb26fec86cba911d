//! Record encoding and decoding errors.

use thiserror::Error;

/// Errors from turning records into lines and back.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A record could not be serialized.
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),

    /// A line was not a valid record (bad UTF-8, bad JSON, unknown `type`,
    /// missing or out-of-range field).
    #[error("malformed record: {reason}")]
    Decode {
        /// Decoder message.
        reason: String,
    },

    /// A line exceeded the frame limit.
    #[error("frame too large: {size} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Observed size in bytes.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}
