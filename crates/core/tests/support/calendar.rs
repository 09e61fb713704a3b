use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tandem_core::CalendarTransport;
use tandem_domain::{
    EventDraft, EventPatch, ExternalEvent, Result as DomainResult, SyncError,
};

/// In-memory mock for `CalendarTransport`.
///
/// Serves a fixed set of events, records every mutation, and can be armed
/// to fail specific operations for fail-closed ordering tests.
#[derive(Default, Clone)]
pub struct MockCalendarTransport {
    events: Arc<Mutex<Vec<ExternalEvent>>>,
    fail_list: Arc<Mutex<Option<SyncError>>>,
    fail_create: Arc<Mutex<Option<SyncError>>>,
    fail_update: Arc<Mutex<Option<SyncError>>>,
    fail_delete: Arc<Mutex<Option<SyncError>>>,
    next_id: Arc<AtomicUsize>,
    pub list_calls: Arc<AtomicUsize>,
    pub create_calls: Arc<AtomicUsize>,
    pub update_calls: Arc<AtomicUsize>,
    pub delete_calls: Arc<AtomicUsize>,
    created: Arc<Mutex<Vec<EventDraft>>>,
    updated: Arc<Mutex<Vec<(String, EventPatch)>>>,
    deleted: Arc<Mutex<Vec<String>>>,
}

impl MockCalendarTransport {
    /// Create a new mock serving the provided events.
    pub fn new(events: Vec<ExternalEvent>) -> Self {
        Self {
            events: Arc::new(Mutex::new(events)),
            ..Self::default()
        }
    }

    /// Replace the served events, simulating provider-side changes.
    pub fn set_events(&self, events: Vec<ExternalEvent>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn fail_list_with(&self, err: SyncError) {
        *self.fail_list.lock().unwrap() = Some(err);
    }

    pub fn fail_create_with(&self, err: SyncError) {
        *self.fail_create.lock().unwrap() = Some(err);
    }

    pub fn fail_update_with(&self, err: SyncError) {
        *self.fail_update.lock().unwrap() = Some(err);
    }

    pub fn fail_delete_with(&self, err: SyncError) {
        *self.fail_delete.lock().unwrap() = Some(err);
    }

    pub fn created(&self) -> Vec<EventDraft> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(String, EventPatch)> {
        self.updated.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn armed(slot: &Mutex<Option<SyncError>>) -> Option<SyncError> {
        slot.lock().unwrap().take()
    }
}

#[async_trait]
impl CalendarTransport for MockCalendarTransport {
    async fn list_events(
        &self,
        _user_email: &str,
        _calendar_id: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> DomainResult<Vec<ExternalEvent>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = Self::armed(&self.fail_list) {
            return Err(err);
        }
        Ok(self.events.lock().unwrap().clone())
    }

    async fn create_event(
        &self,
        _user_email: &str,
        _calendar_id: &str,
        draft: &EventDraft,
    ) -> DomainResult<ExternalEvent> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = Self::armed(&self.fail_create) {
            return Err(err);
        }
        let id = format!("evt-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.created.lock().unwrap().push(draft.clone());
        Ok(ExternalEvent {
            id,
            summary: Some(draft.summary.clone()),
            start: None,
            end: None,
        })
    }

    async fn update_event(
        &self,
        _user_email: &str,
        _calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> DomainResult<ExternalEvent> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = Self::armed(&self.fail_update) {
            return Err(err);
        }
        self.updated
            .lock()
            .unwrap()
            .push((event_id.to_string(), patch.clone()));
        Ok(ExternalEvent {
            id: event_id.to_string(),
            summary: patch.summary.clone(),
            start: None,
            end: None,
        })
    }

    async fn delete_event(
        &self,
        _user_email: &str,
        _calendar_id: &str,
        event_id: &str,
    ) -> DomainResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = Self::armed(&self.fail_delete) {
            return Err(err);
        }
        self.deleted.lock().unwrap().push(event_id.to_string());
        Ok(())
    }
}
