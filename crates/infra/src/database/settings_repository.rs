//! SQLite implementation of the SettingsRepository port.
//!
//! Settings are stored as namespaced key/value rows; per-user keys are
//! prefixed with the owning user's email.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tandem_core::SettingsRepository;
use tandem_domain::Result;
use tracing::instrument;

use super::manager::DbPool;
use crate::errors::InfraError;

const TIMEZONE_KEY: &str = "timezone";

/// SQLite implementation of SettingsRepository
pub struct SqliteSettingsRepository {
    pool: DbPool,
}

impl SqliteSettingsRepository {
    /// Create a new settings repository sharing the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn user_key(user_email: &str, key: &str) -> String {
        format!("{user_email}::{key}")
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn get_user_timezone(&self, user_email: &str) -> Result<Option<String>> {
        let conn = self.pool.get().map_err(InfraError::from)?;
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![Self::user_key(user_email, TIMEZONE_KEY)],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| InfraError::from(e).into())
    }

    #[instrument(skip(self), fields(user = %user_email, timezone))]
    async fn set_user_timezone(&self, user_email: &str, timezone: &str) -> Result<()> {
        let conn = self.pool.get().map_err(InfraError::from)?;
        conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
            params![
                Self::user_key(user_email, TIMEZONE_KEY),
                timezone,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}
