//! Error type for the common crate.

use thiserror::Error;

/// Errors raised by common primitives.
#[derive(Error, Debug)]
pub enum CommonError {
    /// Encryption or decryption failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Invariant violation inside a common primitive.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for common operations.
pub type CommonResult<T> = std::result::Result<T, CommonError>;
