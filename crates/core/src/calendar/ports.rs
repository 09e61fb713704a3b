//! Port interfaces for the calendar provider boundary
//!
//! These traits define the boundaries between the engine's business logic
//! and the provider-specific infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tandem_domain::{CalendarCredential, EventDraft, EventPatch, ExternalEvent, Result};

/// Trait for authenticated calls against the external calendar API.
///
/// Implementations obtain a fresh access credential immediately before each
/// request and classify auth-rejected responses as `ReauthRequired` after
/// invalidating the stored credential.
#[async_trait]
pub trait CalendarTransport: Send + Sync {
    /// List all events overlapping the inclusive date range.
    ///
    /// Follows the provider's continuation token until exhausted and returns
    /// the accumulated list; callers never see partial pages. Events the
    /// provider returns without an id are discarded.
    async fn list_events(
        &self,
        user_email: &str,
        calendar_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExternalEvent>>;

    /// Create an event and return the provider's representation, including
    /// the provider-assigned id.
    async fn create_event(
        &self,
        user_email: &str,
        calendar_id: &str,
        draft: &EventDraft,
    ) -> Result<ExternalEvent>;

    /// Patch an event; fields absent from the patch are left untouched.
    async fn update_event(
        &self,
        user_email: &str,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<ExternalEvent>;

    /// Delete an event. Success means the provider confirmed the delete.
    async fn delete_event(&self, user_email: &str, calendar_id: &str, event_id: &str)
        -> Result<()>;
}

/// Trait for the durable per-user credential store.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Load the credential row; `None` means calendar features are disabled
    /// for this user.
    async fn get(&self, user_email: &str) -> Result<Option<CalendarCredential>>;

    /// Insert or replace the credential row (successful authorization).
    async fn upsert(&self, credential: &CalendarCredential) -> Result<()>;

    /// Persist a freshly refreshed access credential and its expiry.
    async fn update_access_token(
        &self,
        user_email: &str,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Remove the credential row. Used when the provider reports the refresh
    /// credential permanently invalid; deleting is idempotent.
    async fn delete(&self, user_email: &str) -> Result<()>;
}
