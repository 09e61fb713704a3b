//! Inbound reconciliation of external events into the local task store

use std::collections::HashMap;
use std::sync::Arc;

use tandem_domain::{
    Result, SyncError, SyncWindow, TaskDraft, TaskPatch, TaskSource,
};
use tracing::{debug, instrument};

use crate::calendar::mapper;
use crate::calendar::ports::CalendarTransport;
use crate::tasks::ports::{SettingsRepository, TaskRepository};

/// Pulls a window of external events and upserts them into the task store.
///
/// The pass is idempotent: running it twice over an unchanged window leaves
/// the store byte-identical, because every event is matched to its linked
/// task by (owner, event id) before deciding between create and update.
pub struct InboundReconciler {
    transport: Arc<dyn CalendarTransport>,
    tasks: Arc<dyn TaskRepository>,
    settings: Arc<dyn SettingsRepository>,
}

impl InboundReconciler {
    pub fn new(
        transport: Arc<dyn CalendarTransport>,
        tasks: Arc<dyn TaskRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        Self {
            transport,
            tasks,
            settings,
        }
    }

    /// Run one reconciliation pass and return the number of events seen.
    ///
    /// All store writes happen in a single atomic batch at the end; a failed
    /// pass changes nothing locally.
    #[instrument(skip(self), fields(user = %window.user_email, calendar = %window.calendar_id))]
    pub async fn sync(&self, window: &SyncWindow) -> Result<usize> {
        if window.start > window.end {
            return Err(SyncError::InvalidInput(format!(
                "window start {} is after end {}",
                window.start, window.end
            )));
        }

        let events = self
            .transport
            .list_events(
                &window.user_email,
                &window.calendar_id,
                window.start,
                window.end,
            )
            .await?;

        if events.is_empty() {
            debug!("window is empty, nothing to reconcile");
            return Ok(0);
        }

        // The transport already drops id-less items; filter again so a
        // misbehaving implementation cannot corrupt the link table.
        let mut by_id = HashMap::with_capacity(events.len());
        let mut order = Vec::with_capacity(events.len());
        for event in events {
            if event.id.is_empty() {
                continue;
            }
            let id = event.id.clone();
            if by_id.insert(id.clone(), event).is_none() {
                order.push(id);
            }
        }
        let event_count = order.len();

        let ids: Vec<String> = order.clone();
        let existing = self
            .tasks
            .find_by_external_ids(&window.user_email, &window.calendar_id, &ids)
            .await?;
        let linked: HashMap<String, String> = existing
            .into_iter()
            .filter_map(|t| t.google_event_id.clone().map(|eid| (eid, t.id)))
            .collect();

        let tz_name = self.settings.get_user_timezone(&window.user_email).await?;
        let tz = mapper::resolve_timezone(tz_name.as_deref());

        let mut creates = Vec::new();
        let mut updates = Vec::new();
        for event_id in order {
            let Some(event) = by_id.get(&event_id) else {
                continue;
            };
            let fields = mapper::event_to_task_fields(event, tz);
            match linked.get(&event_id) {
                Some(task_id) => updates.push((
                    task_id.clone(),
                    TaskPatch {
                        title: Some(fields.title),
                        source: Some(TaskSource::Google),
                        scheduled_date: Some(fields.scheduled_date),
                        scheduled_time: Some(fields.scheduled_time),
                        google_calendar_id: Some(Some(window.calendar_id.clone())),
                        google_event_id: Some(Some(event_id)),
                        ..TaskPatch::default()
                    },
                )),
                None => creates.push(TaskDraft {
                    title: fields.title,
                    source: TaskSource::Google,
                    scheduled_date: fields.scheduled_date,
                    scheduled_time: fields.scheduled_time,
                    google_calendar_id: Some(window.calendar_id.clone()),
                    google_event_id: Some(event_id),
                    ..TaskDraft::default()
                }),
            }
        }

        debug!(
            events = event_count,
            creates = creates.len(),
            updates = updates.len(),
            "applying reconciliation batch"
        );
        self.tasks
            .upsert_batch(&window.user_email, creates, updates)
            .await?;

        Ok(event_count)
    }
}
