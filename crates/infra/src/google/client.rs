//! Google Calendar HTTP transport.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tandem_core::CalendarTransport;
use tandem_domain::{
    EventDraft, EventDraftTime, EventPatch, EventTime, ExternalEvent, GoogleCalendarConfig,
    Result, SyncError, EVENTS_PAGE_SIZE,
};
use tracing::{debug, instrument, warn};

use crate::errors::InfraError;
use crate::google::token_manager::TokenManager;

/// Calendar transport backed by the Google Calendar v3 REST API.
///
/// Every request obtains a fresh access credential from the token manager
/// immediately before it is sent. Requests are never retried here; transient
/// failures surface to the caller.
pub struct GoogleCalendarClient {
    tokens: TokenManager,
    http: reqwest::Client,
    config: GoogleCalendarConfig,
}

impl GoogleCalendarClient {
    /// Create a client sharing the token manager's provider configuration.
    pub fn new(tokens: TokenManager, config: GoogleCalendarConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(InfraError::from)?;
        Ok(Self { tokens, http, config })
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.config.api_base_url,
            urlencoding::encode(calendar_id)
        )
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        )
    }

    /// Map a non-success API response to a domain error, invalidating the
    /// stored credential when the API rejected it.
    async fn api_error(
        &self,
        user_email: &str,
        status: StatusCode,
        body: String,
    ) -> SyncError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                if let Err(err) = self.tokens.mark_revoked(user_email).await {
                    warn!(error = %err, "failed to drop rejected credential");
                }
                SyncError::ReauthRequired(format!("calendar API rejected credential ({status})"))
            }
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                SyncError::NotFound(format!("calendar resource not found ({status})"))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                SyncError::Transient(format!("rate limited ({status}): {body}"))
            }
            s if s.is_server_error() => {
                SyncError::Transient(format!("calendar API error ({status}): {body}"))
            }
            _ => SyncError::Internal(format!("calendar API error ({status}): {body}")),
        }
    }

    async fn parse_event_response(
        &self,
        user_email: &str,
        response: reqwest::Response,
    ) -> Result<ExternalEvent> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.api_error(user_email, status, body).await);
        }
        let wire: WireEvent = response.json().await.map_err(InfraError::from)?;
        wire.into_external().ok_or_else(|| {
            SyncError::Internal("calendar API returned an event without an id".into())
        })
    }
}

#[async_trait]
impl CalendarTransport for GoogleCalendarClient {
    #[instrument(skip(self), fields(user = %user_email, calendar = %calendar_id))]
    async fn list_events(
        &self,
        user_email: &str,
        calendar_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExternalEvent>> {
        let time_min = format!("{}T00:00:00Z", start.format("%Y-%m-%d"));
        let time_max = format!("{}T23:59:59Z", end.format("%Y-%m-%d"));
        let url = self.events_url(calendar_id);

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let access = self.tokens.get_access_token(user_email).await?;
            let mut query: Vec<(&str, String)> = vec![
                ("timeMin", time_min.clone()),
                ("timeMax", time_max.clone()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", EVENTS_PAGE_SIZE.to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(&access.token)
                .query(&query)
                .send()
                .await
                .map_err(InfraError::from)?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(self.api_error(user_email, status, body).await);
            }

            let page: WireEventList = response.json().await.map_err(InfraError::from)?;
            for wire in page.items {
                match wire.into_external() {
                    Some(event) => events.push(event),
                    None => warn!("discarding event without id"),
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = events.len(), "listed calendar events");
        Ok(events)
    }

    #[instrument(skip(self, draft), fields(user = %user_email, calendar = %calendar_id))]
    async fn create_event(
        &self,
        user_email: &str,
        calendar_id: &str,
        draft: &EventDraft,
    ) -> Result<ExternalEvent> {
        let access = self.tokens.get_access_token(user_email).await?;
        let body = WireEventWrite::from_draft(draft);
        let response = self
            .http
            .post(self.events_url(calendar_id))
            .bearer_auth(&access.token)
            .json(&body)
            .send()
            .await
            .map_err(InfraError::from)?;
        self.parse_event_response(user_email, response).await
    }

    #[instrument(skip(self, patch), fields(user = %user_email, calendar = %calendar_id, event = %event_id))]
    async fn update_event(
        &self,
        user_email: &str,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<ExternalEvent> {
        let access = self.tokens.get_access_token(user_email).await?;
        let body = WireEventWrite::from_patch(patch);
        let response = self
            .http
            .patch(self.event_url(calendar_id, event_id))
            .bearer_auth(&access.token)
            .json(&body)
            .send()
            .await
            .map_err(InfraError::from)?;
        self.parse_event_response(user_email, response).await
    }

    #[instrument(skip(self), fields(user = %user_email, calendar = %calendar_id, event = %event_id))]
    async fn delete_event(
        &self,
        user_email: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<()> {
        let access = self.tokens.get_access_token(user_email).await?;
        let response = self
            .http
            .delete(self.event_url(calendar_id, event_id))
            .bearer_auth(&access.token)
            .send()
            .await
            .map_err(InfraError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        // An event that is already gone counts as a confirmed delete.
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            debug!("event already deleted on provider");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(self.api_error(user_email, status, body).await)
    }
}

/* -------------------------------------------------------------------------- */
/* Wire types */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Deserialize)]
struct WireEventList {
    #[serde(default)]
    items: Vec<WireEvent>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    id: Option<String>,
    summary: Option<String>,
    start: Option<WireEventTime>,
    end: Option<WireEventTime>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(rename = "timeZone", skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireEventWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<WireEventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<WireEventTime>,
}

impl WireEvent {
    /// Convert into the domain shape, dropping id-less events.
    fn into_external(self) -> Option<ExternalEvent> {
        let id = self.id.filter(|s| !s.is_empty())?;
        Some(ExternalEvent {
            summary: self.summary,
            start: self.start.and_then(|t| t.into_event_time(&id)),
            end: self.end.and_then(|t| t.into_event_time(&id)),
            id,
        })
    }
}

impl WireEventTime {
    fn into_event_time(self, event_id: &str) -> Option<EventTime> {
        if let Some(raw) = self.date_time {
            return match DateTime::parse_from_rfc3339(&raw) {
                Ok(dt) => Some(EventTime::Instant(dt.with_timezone(&Utc))),
                Err(err) => {
                    warn!(event_id, raw, error = %err, "unparseable event dateTime");
                    None
                }
            };
        }
        if let Some(raw) = self.date {
            return match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
                Ok(date) => Some(EventTime::Date(date)),
                Err(err) => {
                    warn!(event_id, raw, error = %err, "unparseable event date");
                    None
                }
            };
        }
        None
    }

    fn from_draft_time(time: &EventDraftTime) -> Self {
        match time {
            EventDraftTime::Date(date) => Self {
                date: Some(date.format("%Y-%m-%d").to_string()),
                date_time: None,
                time_zone: None,
            },
            EventDraftTime::Timed { instant, time_zone } => Self {
                date: None,
                date_time: Some(instant.to_rfc3339()),
                time_zone: Some(time_zone.clone()),
            },
        }
    }
}

impl WireEventWrite {
    fn from_draft(draft: &EventDraft) -> Self {
        Self {
            summary: Some(draft.summary.clone()),
            start: Some(WireEventTime::from_draft_time(&draft.start)),
            end: Some(WireEventTime::from_draft_time(&draft.end)),
        }
    }

    fn from_patch(patch: &EventPatch) -> Self {
        Self {
            summary: patch.summary.clone(),
            start: patch.start.as_ref().map(WireEventTime::from_draft_time),
            end: patch.end.as_ref().map(WireEventTime::from_draft_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idless_events_are_dropped() {
        let wire = WireEvent { id: None, summary: Some("x".into()), start: None, end: None };
        assert!(wire.into_external().is_none());
        let empty = WireEvent {
            id: Some(String::new()),
            summary: None,
            start: None,
            end: None,
        };
        assert!(empty.into_external().is_none());
    }

    #[test]
    fn all_day_wire_time_parses_to_date() {
        let time = WireEventTime {
            date: Some("2024-05-01".into()),
            date_time: None,
            time_zone: None,
        };
        assert_eq!(
            time.into_event_time("e"),
            Some(EventTime::Date(
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
            ))
        );
    }

    #[test]
    fn timed_wire_time_normalizes_to_utc() {
        let time = WireEventTime {
            date: None,
            date_time: Some("2024-03-10T04:30:00-03:00".into()),
            time_zone: Some("America/Sao_Paulo".into()),
        };
        let Some(EventTime::Instant(instant)) = time.into_event_time("e") else {
            panic!("expected instant");
        };
        assert_eq!(instant, "2024-03-10T07:30:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn unparseable_times_are_dropped_not_fatal() {
        let time = WireEventTime {
            date: None,
            date_time: Some("not a time".into()),
            time_zone: None,
        };
        assert_eq!(time.into_event_time("e"), None);
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let body = WireEventWrite::from_patch(&EventPatch {
            summary: Some("Renamed".into()),
            start: None,
            end: None,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "summary": "Renamed" }));
    }
}
