//! Error types for ssl-context-info.
//!
//! Two layers of failure exist, mirroring the two layers of the pipeline:
//!
//! - [`ScanError`] - the outer base64 scan over the input file cannot
//!   continue at all (I/O failure, or the bad-symbol heuristic tripped).
//! - [`DecodeError`] - one recovered blob could not be decoded. These are
//!   always local to a single blob; the scan loop reports them and moves on
//!   to the next candidate run.
//!
//! All errors implement `std::error::Error` and can be converted to
//! `anyhow::Error`.

use thiserror::Error;

/// Errors that stop the whole scan over the input file.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The balance between valid and invalid base64 characters dropped below
    /// the abort threshold. The input is almost certainly a binary file
    /// (zip, ISO, executable) rather than text with embedded base64.
    #[error("too many bad symbols detected, file check aborted")]
    TooManyBadSymbols,

    /// I/O error while reading the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors local to one recovered blob.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The buffer ran out of bytes before a field could be read
    #[error("buffer does not have enough data to complete the parsing (need {need} bytes, have {have})")]
    Truncated {
        /// Number of bytes the next field requires.
        need: usize,
        /// Number of bytes still available in the buffer.
        have: usize,
    },

    /// A field value violates a structural constraint of the wire format
    #[error("{field}: {reason}")]
    Malformed {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable description of the violation.
        reason: String,
    },

    /// The candidate run is not decodable base64 after all
    #[error("base64 code cannot be decoded: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Result type alias for blob decoding.
pub type Result<T> = std::result::Result<T, DecodeError>;
