//! Port interfaces for the task and settings stores
//!
//! These traits define the boundary between the sync engine and the
//! relational storage layer, which is owned by the surrounding application.

use async_trait::async_trait;
use chrono::NaiveDate;
use tandem_domain::{Result, Task, TaskDraft, TaskPatch};

/// Trait for persisting and querying local tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Load all tasks of a user whose external event id is in `ids`.
    ///
    /// This is the idempotency-key lookup of the inbound reconciler: one
    /// query for the whole window, never per-event probing.
    async fn find_by_external_ids(
        &self,
        user_email: &str,
        calendar_id: &str,
        ids: &[String],
    ) -> Result<Vec<Task>>;

    /// Apply creates and updates as one atomic batch.
    ///
    /// A partial failure must leave the store exactly as it was before the
    /// call. Returns the number of rows written.
    async fn upsert_batch(
        &self,
        user_email: &str,
        creates: Vec<TaskDraft>,
        updates: Vec<(String, TaskPatch)>,
    ) -> Result<usize>;

    /// List tasks scheduled within the inclusive date range, ordered by
    /// date, time, then creation instant. `include_unscheduled` also returns
    /// tasks with no scheduled date.
    async fn list_in_range(
        &self,
        user_email: &str,
        start: NaiveDate,
        end: NaiveDate,
        include_unscheduled: bool,
    ) -> Result<Vec<Task>>;

    /// Fetch a single task; `SyncError::NotFound` when absent or owned by
    /// another user.
    async fn get(&self, user_email: &str, task_id: &str) -> Result<Task>;

    /// Create a single task, assigning id and timestamps.
    async fn create(&self, user_email: &str, draft: TaskDraft) -> Result<Task>;

    /// Apply a patch to a single task and return the updated record.
    async fn update(&self, user_email: &str, task_id: &str, patch: TaskPatch) -> Result<Task>;

    /// Delete a single task.
    async fn delete(&self, user_email: &str, task_id: &str) -> Result<()>;
}

/// Trait for user-scoped settings the engine consults.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// IANA timezone configured by the user, if any.
    async fn get_user_timezone(&self, user_email: &str) -> Result<Option<String>>;

    /// Store the user's timezone.
    async fn set_user_timezone(&self, user_email: &str, timezone: &str) -> Result<()>;
}
