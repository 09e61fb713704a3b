//! External calendar state: credentials, provider events, and drafts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Durable per-user calendar credential record.
///
/// Presence of a row means the user has authorized calendar access at some
/// point; absence means calendar features are disabled for that user (not an
/// error). The refresh credential is stored sealed (AES-256-GCM); only the
/// short-lived access credential is cached in the clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarCredential {
    pub user_email: String,
    /// Sealed refresh credential: `base64(nonce || tag || ciphertext)`.
    pub refresh_token_sealed: String,
    pub access_token: Option<String>,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub scope: String,
    pub updated_at: DateTime<Utc>,
}

impl CalendarCredential {
    /// Remaining validity of the cached access credential, in seconds.
    /// Negative when already expired, `None` when nothing is cached.
    pub fn access_token_remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        match (&self.access_token, self.access_token_expires_at) {
            (Some(_), Some(expires_at)) => Some((expires_at - now).num_seconds()),
            _ => None,
        }
    }
}

/// Scheduling information of a provider event, as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    /// All-day event: a date with no time component.
    Date(NaiveDate),
    /// Timed event: an absolute instant (timezone-normalized to UTC).
    Instant(DateTime<Utc>),
}

/// A calendar entry owned by the external provider.
///
/// Transient: never persisted as-is. The provider-assigned id is required;
/// events arriving without one are discarded before reaching the engine
/// because they cannot be tracked for idempotent upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalEvent {
    pub id: String,
    pub summary: Option<String>,
    /// None when the provider returned neither a date nor an instant.
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
}

/// Scheduling information for an event the engine is about to create or
/// patch. Timed drafts carry the IANA timezone identifier, not just an
/// offset, so the provider can re-render if its rules change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventDraftTime {
    /// All-day: a bare date.
    Date(NaiveDate),
    /// Timed: an instant plus the wall-clock timezone it was derived from.
    Timed {
        instant: DateTime<Utc>,
        time_zone: String,
    },
}

/// Outbound event creation draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub summary: String,
    pub start: EventDraftTime,
    pub end: EventDraftTime,
}

/// Outbound event patch; `None` fields are left untouched on the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
    pub summary: Option<String>,
    pub start: Option<EventDraftTime>,
    pub end: Option<EventDraftTime>,
}

impl EventPatch {
    /// True when the patch would not change anything on the provider.
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.start.is_none() && self.end.is_none()
    }
}

/// Scope of one inbound reconciliation pass. Exists only as a parameter
/// object for a single invocation; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncWindow {
    pub user_email: String,
    /// Inclusive start date.
    pub start: NaiveDate,
    /// Inclusive end date.
    pub end: NaiveDate,
    pub calendar_id: String,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn remaining_secs_requires_cached_token_and_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().unwrap();
        let mut cred = CalendarCredential {
            user_email: "a@b.c".into(),
            refresh_token_sealed: "sealed".into(),
            access_token: None,
            access_token_expires_at: None,
            scope: "calendar".into(),
            updated_at: now,
        };
        assert_eq!(cred.access_token_remaining_secs(now), None);

        cred.access_token = Some("tok".into());
        cred.access_token_expires_at = Some(now + Duration::seconds(90));
        assert_eq!(cred.access_token_remaining_secs(now), Some(90));

        cred.access_token_expires_at = Some(now - Duration::seconds(5));
        assert_eq!(cred.access_token_remaining_secs(now), Some(-5));
    }
}
