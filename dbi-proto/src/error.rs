//! Error type for payload parsing.

use std::string::FromUtf8Error;

/// Errors returned when a buffer cannot be parsed as a protocol structure.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProtoError {
    /// The buffer ended before a fixed-size header was complete.
    #[error("truncated {what}: need {expected} bytes, got {actual}")]
    Truncated {
        /// Structure being parsed.
        what: &'static str,
        /// Minimum number of bytes required.
        expected: usize,
        /// Number of bytes available.
        actual: usize,
    },

    /// The requested file name is not valid UTF-8.
    #[error("file name is not valid UTF-8")]
    InvalidName(#[from] FromUtf8Error),
}
