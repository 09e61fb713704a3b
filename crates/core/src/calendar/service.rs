//! Facade combining inbound reconciliation with task listing

use std::sync::Arc;

use chrono::NaiveDate;
use tandem_domain::{Result, SyncError, SyncWindow, Task, PRIMARY_CALENDAR_ID};
use tracing::{instrument, warn};

use crate::calendar::outbound::OutboundMutator;
use crate::calendar::ports::CalendarTransport;
use crate::calendar::reconciler::InboundReconciler;
use crate::tasks::ports::{SettingsRepository, TaskRepository};

/// Result of a degraded-capable listing: the tasks are always present,
/// while a failed sync surfaces as a warning instead of an error.
#[derive(Debug, Clone)]
pub struct TaskListing {
    pub tasks: Vec<Task>,
    pub sync_warning: Option<String>,
}

/// Entry point for dashboard calendar features.
pub struct CalendarSyncService {
    tasks: Arc<dyn TaskRepository>,
    reconciler: InboundReconciler,
    outbound: OutboundMutator,
}

impl CalendarSyncService {
    pub fn new(
        transport: Arc<dyn CalendarTransport>,
        tasks: Arc<dyn TaskRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        let reconciler = InboundReconciler::new(
            Arc::clone(&transport),
            Arc::clone(&tasks),
            Arc::clone(&settings),
        );
        let outbound =
            OutboundMutator::new(transport, Arc::clone(&tasks), settings);
        Self {
            tasks,
            reconciler,
            outbound,
        }
    }

    /// Run one inbound reconciliation pass over the default calendar.
    pub async fn sync_window(
        &self,
        user_email: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize> {
        let window = SyncWindow {
            user_email: user_email.to_string(),
            start,
            end,
            calendar_id: PRIMARY_CALENDAR_ID.to_string(),
        };
        self.reconciler.sync(&window).await
    }

    /// List tasks in a date range, reconciling the window first.
    ///
    /// The listing degrades instead of failing: a user without a calendar
    /// connection gets their local tasks silently, and any other sync
    /// failure is reported as a warning alongside the tasks.
    #[instrument(skip(self), fields(user = %user_email))]
    pub async fn list_tasks_synced(
        &self,
        user_email: &str,
        start: NaiveDate,
        end: NaiveDate,
        include_unscheduled: bool,
    ) -> Result<TaskListing> {
        let sync_warning = match self.sync_window(user_email, start, end).await {
            Ok(_) => None,
            Err(SyncError::NotConnected) => None,
            Err(err) => {
                warn!(error = %err, "calendar sync failed, listing local tasks only");
                Some(format!("calendar sync failed: {err}"))
            }
        };

        let tasks = self
            .tasks
            .list_in_range(user_email, start, end, include_unscheduled)
            .await?;
        Ok(TaskListing { tasks, sync_warning })
    }

    /// Outbound mutation surface.
    pub fn outbound(&self) -> &OutboundMutator {
        &self.outbound
    }
}
