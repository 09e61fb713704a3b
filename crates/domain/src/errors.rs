//! Error types used throughout the sync engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Tandem sync operations.
///
/// `Clone` is required because refresh results are fanned out to every
/// caller waiting on the same in-flight token refresh.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SyncError {
    /// No calendar credential on file for the user. Calendar features are
    /// inactive for this user; this is not a failure condition.
    #[error("calendar not connected")]
    NotConnected,

    /// The provider reported the stored refresh credential as permanently
    /// invalid. The credential row has been deleted; the user must
    /// re-authorize calendar access.
    #[error("calendar authorization expired: {0}")]
    ReauthRequired(String),

    /// Network error, timeout, or provider 5xx. Safe to retry later; the
    /// engine itself never retries.
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("security error: {0}")]
    Security(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for sync engine operations
pub type Result<T> = std::result::Result<T, SyncError>;
