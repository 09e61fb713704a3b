//! SQLite implementation of the CredentialRepository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tandem_core::CredentialRepository;
use tandem_domain::{CalendarCredential, Result};
use tracing::{debug, instrument};

use super::manager::DbPool;
use crate::errors::InfraError;

/// SQLite implementation of CredentialRepository
pub struct SqliteCredentialRepository {
    pool: DbPool,
}

impl SqliteCredentialRepository {
    /// Create a new credential repository sharing the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>> {
        self.pool.get().map_err(|e| InfraError::from(e).into())
    }
}

#[async_trait]
impl CredentialRepository for SqliteCredentialRepository {
    async fn get(&self, user_email: &str) -> Result<Option<CalendarCredential>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT user_email, refresh_token_sealed, access_token,
                    access_token_expires_at, scope, updated_at
             FROM calendar_credentials WHERE user_email = ?1",
            params![user_email],
            row_to_credential,
        )
        .optional()
        .map_err(|e| InfraError::from(e).into())
    }

    #[instrument(skip(self, credential), fields(user = %credential.user_email))]
    async fn upsert(&self, credential: &CalendarCredential) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO calendar_credentials
                 (user_email, refresh_token_sealed, access_token,
                  access_token_expires_at, scope, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (user_email) DO UPDATE SET
                 refresh_token_sealed = excluded.refresh_token_sealed,
                 access_token = excluded.access_token,
                 access_token_expires_at = excluded.access_token_expires_at,
                 scope = excluded.scope,
                 updated_at = excluded.updated_at",
            params![
                credential.user_email,
                credential.refresh_token_sealed,
                credential.access_token,
                credential.access_token_expires_at.map(|dt| dt.to_rfc3339()),
                credential.scope,
                credential.updated_at.to_rfc3339(),
            ],
        )
        .map_err(InfraError::from)?;
        debug!("credential stored");
        Ok(())
    }

    #[instrument(skip(self, access_token), fields(user = %user_email))]
    async fn update_access_token(
        &self,
        user_email: &str,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE calendar_credentials
             SET access_token = ?1, access_token_expires_at = ?2, updated_at = ?3
             WHERE user_email = ?4",
            params![
                access_token,
                expires_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
                user_email
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    #[instrument(skip(self), fields(user = %user_email))]
    async fn delete(&self, user_email: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM calendar_credentials WHERE user_email = ?1",
            params![user_email],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}

fn row_to_credential(row: &Row<'_>) -> rusqlite::Result<CalendarCredential> {
    Ok(CalendarCredential {
        user_email: row.get(0)?,
        refresh_token_sealed: row.get(1)?,
        access_token: row.get(2)?,
        access_token_expires_at: row
            .get::<_, Option<String>>(3)?
            .map(|s| parse_datetime(&s, 3))
            .transpose()?,
        scope: row.get(4)?,
        updated_at: parse_datetime(&row.get::<_, String>(5)?, 5)?,
    })
}

fn parse_datetime(raw: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
