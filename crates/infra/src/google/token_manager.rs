//! Access credential lifecycle: cached fast path, single-flight refresh,
//! and permanent-revocation handling.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::Shared;
use futures::FutureExt;
use serde::Deserialize;
use tandem_common::crypto::TokenCipher;
use tandem_core::CredentialRepository;
use tandem_domain::{
    CalendarCredential, GoogleCalendarConfig, Result, SyncError,
    ACCESS_TOKEN_EXPIRY_SLACK_SECS,
};
use tracing::{debug, info, instrument, warn};

use crate::errors::InfraError;
use crate::google::classify::{classify_auth_failure, AuthFailure};

/// A cleartext access credential together with its expiry instant.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

type RefreshFuture = Shared<Pin<Box<dyn Future<Output = Result<AccessToken>> + Send>>>;

/// Manages per-user refresh and access credentials.
///
/// Concurrent callers asking for the same user's credential while a refresh
/// is in flight all await the same future and receive the same settled
/// result; the provider sees at most one refresh request.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

struct Inner {
    credentials: Arc<dyn CredentialRepository>,
    cipher: TokenCipher,
    http: reqwest::Client,
    config: GoogleCalendarConfig,
    in_flight: DashMap<String, RefreshFuture>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl TokenManager {
    /// Create a manager from the provider configuration.
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        config: GoogleCalendarConfig,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(InfraError::from)?;
        let cipher =
            TokenCipher::from_secret(&config.token_encryption_key).map_err(InfraError::from)?;
        Ok(Self {
            inner: Arc::new(Inner {
                credentials,
                cipher,
                http,
                config,
                in_flight: DashMap::new(),
            }),
        })
    }

    /// Seal and store a refresh credential obtained from the consent flow.
    ///
    /// Replaces any previous credential for the user and clears the cached
    /// access credential so the next call refreshes against the new grant.
    #[instrument(skip(self, refresh_token), fields(user = %user_email))]
    pub async fn store_refresh_token(
        &self,
        user_email: &str,
        refresh_token: &str,
        scope: &str,
    ) -> Result<()> {
        let sealed = self
            .inner
            .cipher
            .seal(refresh_token)
            .map_err(InfraError::from)?;
        let credential = CalendarCredential {
            user_email: user_email.to_string(),
            refresh_token_sealed: sealed,
            access_token: None,
            access_token_expires_at: None,
            scope: scope.to_string(),
            updated_at: Utc::now(),
        };
        self.inner.credentials.upsert(&credential).await?;
        info!("refresh credential stored");
        Ok(())
    }

    /// Return a valid access credential for the user, refreshing if needed.
    ///
    /// Fails with `NotConnected` when no credential row exists and with
    /// `ReauthRequired` when the provider rejected the refresh credential
    /// permanently (the row is deleted before returning).
    #[instrument(skip(self), fields(user = %user_email))]
    pub async fn get_access_token(&self, user_email: &str) -> Result<AccessToken> {
        let credential = self
            .inner
            .credentials
            .get(user_email)
            .await?
            .ok_or(SyncError::NotConnected)?;

        let now = Utc::now();
        if let Some(remaining) = credential.access_token_remaining_secs(now) {
            if remaining > ACCESS_TOKEN_EXPIRY_SLACK_SECS {
                if let (Some(token), Some(expires_at)) =
                    (credential.access_token, credential.access_token_expires_at)
                {
                    debug!(remaining, "serving cached access credential");
                    return Ok(AccessToken { token, expires_at });
                }
            }
        }

        self.refresh_single_flight(user_email).await
    }

    /// Drop the stored credential after the calendar API rejected it.
    pub async fn mark_revoked(&self, user_email: &str) -> Result<()> {
        warn!(user = %user_email, "dropping revoked calendar credential");
        self.inner.credentials.delete(user_email).await
    }

    async fn refresh_single_flight(&self, user_email: &str) -> Result<AccessToken> {
        let future = match self.inner.in_flight.entry(user_email.to_string()) {
            Entry::Occupied(entry) => {
                debug!("joining in-flight refresh");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let inner = Arc::clone(&self.inner);
                let user = user_email.to_string();
                let future: RefreshFuture =
                    (Box::pin(async move { refresh(&inner, &user).await })
                        as Pin<Box<dyn Future<Output = Result<AccessToken>> + Send>>)
                        .shared();
                entry.insert(future.clone());
                future
            }
        };

        let result = future.clone().await;
        self.inner
            .in_flight
            .remove_if(user_email, |_, f| f.ptr_eq(&future));
        result
    }
}

/// Perform one refresh round trip against the token endpoint.
///
/// Runs at most once per user at a time; the settled result is fanned out
/// to every waiter by the shared future in `refresh_single_flight`.
async fn refresh(inner: &Inner, user_email: &str) -> Result<AccessToken> {
    let credential = inner
        .credentials
        .get(user_email)
        .await?
        .ok_or(SyncError::NotConnected)?;

    let refresh_token = match inner.cipher.open(&credential.refresh_token_sealed) {
        Ok(token) => token,
        Err(err) => {
            warn!(user = %user_email, error = %err, "sealed refresh credential unreadable");
            inner.credentials.delete(user_email).await?;
            return Err(SyncError::ReauthRequired(
                "stored refresh credential could not be decrypted".into(),
            ));
        }
    };

    let response = inner
        .http
        .post(&inner.config.token_endpoint)
        .form(&[
            ("client_id", inner.config.client_id.as_str()),
            ("client_secret", inner.config.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await
        .map_err(InfraError::from)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return match classify_auth_failure(status, &body) {
            AuthFailure::Permanent => {
                warn!(user = %user_email, %status, "refresh credential rejected permanently");
                inner.credentials.delete(user_email).await?;
                Err(SyncError::ReauthRequired(format!(
                    "token endpoint rejected refresh ({status}): {body}"
                )))
            }
            AuthFailure::Transient => Err(SyncError::Transient(format!(
                "token refresh failed ({status}): {body}"
            ))),
        };
    }

    let token: TokenResponse = response.json().await.map_err(InfraError::from)?;
    let expires_at = Utc::now() + Duration::seconds(token.expires_in);
    inner
        .credentials
        .update_access_token(user_email, &token.access_token, expires_at)
        .await?;
    debug!(user = %user_email, "access credential refreshed");

    Ok(AccessToken {
        token: token.access_token,
        expires_at,
    })
}
