//! Configuration structures for the sync engine
//!
//! Typed configuration consumed by the infrastructure layer. Loading (env
//! vars, config files) lives in `tandem-infra`.

use serde::{Deserialize, Serialize};

use crate::constants::HTTP_TIMEOUT_SECS;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub google: GoogleCalendarConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Connection pool size
    pub pool_size: u32,
}

/// Google Calendar provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleCalendarConfig {
    /// OAuth client id issued by the provider
    pub client_id: String,
    /// OAuth client secret issued by the provider
    pub client_secret: String,
    /// Secret from which the refresh-credential sealing key is derived
    pub token_encryption_key: String,
    /// OAuth token endpoint; overridable for tests
    pub token_endpoint: String,
    /// Calendar API base URL; overridable for tests
    pub api_base_url: String,
    /// Timeout applied to every HTTP call, in seconds
    pub http_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "tandem.db".to_string(), pool_size: 5 }
    }
}

impl GoogleCalendarConfig {
    /// Production endpoints with the given client credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_encryption_key: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_encryption_key: token_encryption_key.into(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            api_base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            http_timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}
