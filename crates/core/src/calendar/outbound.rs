//! Fail-closed outbound mutations: external calendar first, local store second

use std::sync::Arc;

use tandem_domain::{Result, Task, TaskDraft, TaskPatch, PRIMARY_CALENDAR_ID};
use tracing::{debug, instrument, warn};

use crate::calendar::mapper;
use crate::calendar::ports::CalendarTransport;
use crate::tasks::ports::{SettingsRepository, TaskRepository};

/// Applies task mutations that must be mirrored to the external calendar.
///
/// Ordering is strict: the external mutation must succeed before the local
/// store is touched. A provider failure leaves the local task untouched, so
/// the link table never claims an event the provider does not have.
pub struct OutboundMutator {
    transport: Arc<dyn CalendarTransport>,
    tasks: Arc<dyn TaskRepository>,
    settings: Arc<dyn SettingsRepository>,
}

impl OutboundMutator {
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

    async fn timezone(&self, user_email: &str) -> Result<chrono_tz::Tz> {
        let name = self.settings.get_user_timezone(user_email).await?;
        Ok(mapper::resolve_timezone(name.as_deref()))
    }

    /// Create a task together with its external event.
    ///
    /// The event is created first; only once the provider has assigned an id
    /// is the local task written, already linked.
    #[instrument(skip(self, draft), fields(user = %user_email, title = %draft.title))]
    pub async fn create_linked(&self, user_email: &str, mut draft: TaskDraft) -> Result<Task> {
        let tz = self.timezone(user_email).await?;
        let event_draft = mapper::build_outbound_draft(&draft, tz)?;
        let calendar_id = draft
            .google_calendar_id
            .clone()
            .unwrap_or_else(|| PRIMARY_CALENDAR_ID.to_string());

        let event = self
            .transport
            .create_event(user_email, &calendar_id, &event_draft)
            .await?;
        debug!(event_id = %event.id, "external event created");

        draft.google_calendar_id = Some(calendar_id);
        draft.google_event_id = Some(event.id);
        self.tasks.create(user_email, draft).await
    }

    /// Patch a task, mirroring the change to its linked event first.
    ///
    /// Unlinked tasks are patched locally only. A patch that maps to no
    /// event change skips the provider round trip.
    #[instrument(skip(self, patch), fields(user = %user_email, task = %task_id))]
    pub async fn update_linked(
        &self,
        user_email: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<Task> {
        let task = self.tasks.get(user_email, task_id).await?;

        if let (Some(event_id), Some(calendar_id)) =
            (task.google_event_id.as_deref(), task.google_calendar_id.as_deref())
        {
            let tz = self.timezone(user_email).await?;
            let event_patch = mapper::build_outbound_patch(&patch, tz)?;
            if event_patch.is_empty() {
                debug!("patch has no calendar-visible change, skipping provider call");
            } else {
                self.transport
                    .update_event(user_email, calendar_id, event_id, &event_patch)
                    .await?;
                debug!(event_id, "external event patched");
            }
        }

        self.tasks.update(user_email, task_id, patch).await
    }

    /// Delete a task, removing its linked event first.
    ///
    /// The local row is only deleted after the provider confirms the event
    /// delete; a provider failure keeps the task so the user can retry.
    #[instrument(skip(self), fields(user = %user_email, task = %task_id))]
    pub async fn delete_linked(&self, user_email: &str, task_id: &str) -> Result<()> {
        let task = self.tasks.get(user_email, task_id).await?;

        if let (Some(event_id), Some(calendar_id)) =
            (task.google_event_id.as_deref(), task.google_calendar_id.as_deref())
        {
            self.transport
                .delete_event(user_email, calendar_id, event_id)
                .await?;
            debug!(event_id, "external event deleted");
        } else if task.google_event_id.is_some() {
            warn!("task is linked but has no calendar id, deleting locally only");
        }

        self.tasks.delete(user_email, task_id).await
    }
}
