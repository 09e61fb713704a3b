//! Shared fixtures for `tandem-infra` integration tests.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tandem_common::crypto::TokenCipher;
use tandem_domain::{CalendarCredential, GoogleCalendarConfig};
use tandem_infra::database::{
    DbManager, SqliteCredentialRepository, SqliteSettingsRepository, SqliteTaskRepository,
};
use tempfile::TempDir;

pub const TOKEN_SECRET: &str = "integration-test-sealing-secret";
pub const USER: &str = "alice@example.com";

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the schema applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("test.db");

        let manager =
            DbManager::with_path(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("migrations should run");

        Self {
            manager: Arc::new(manager),
            _temp_dir: temp_dir,
        }
    }

    pub fn task_repository(&self) -> SqliteTaskRepository {
        SqliteTaskRepository::new(self.manager.pool().clone())
    }

    pub fn credential_repository(&self) -> SqliteCredentialRepository {
        SqliteCredentialRepository::new(self.manager.pool().clone())
    }

    pub fn settings_repository(&self) -> SqliteSettingsRepository {
        SqliteSettingsRepository::new(self.manager.pool().clone())
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider configuration pointed at a mock server.
pub fn test_config(server_url: &str) -> GoogleCalendarConfig {
    let mut config = GoogleCalendarConfig::new("client-id", "client-secret", TOKEN_SECRET);
    config.token_endpoint = format!("{server_url}/token");
    config.api_base_url = format!("{server_url}/calendar/v3");
    config.http_timeout_secs = 5;
    config
}

/// Build a credential row with a sealed refresh token.
///
/// `access_valid_for_secs` controls the cached access credential: `None`
/// leaves it empty, negative values produce an already expired one.
pub fn credential(user_email: &str, access_valid_for_secs: Option<i64>) -> CalendarCredential {
    let cipher = TokenCipher::from_secret(TOKEN_SECRET).expect("cipher should build");
    let sealed = cipher
        .seal("stored-refresh-token")
        .expect("sealing should succeed");
    let now = Utc::now();
    let (access_token, access_token_expires_at) = match access_valid_for_secs {
        Some(secs) => (
            Some("cached-access-token".to_string()),
            Some(now + Duration::seconds(secs)),
        ),
        None => (None, None),
    };
    CalendarCredential {
        user_email: user_email.to_string(),
        refresh_token_sealed: sealed,
        access_token,
        access_token_expires_at,
        scope: "https://www.googleapis.com/auth/calendar".to_string(),
        updated_at: now,
    }
}
