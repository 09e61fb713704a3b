//! In-memory mocks for the task and settings stores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tandem_core::{SettingsRepository, TaskRepository};
use tandem_domain::{
    Result as DomainResult, SyncError, Task, TaskDraft, TaskPatch,
};
use uuid::Uuid;

/// In-memory mock for `TaskRepository`.
///
/// The batch upsert is all-or-nothing like the real store, and call
/// counters let tests assert that empty windows never touch the store.
#[derive(Default, Clone)]
pub struct MockTaskRepository {
    tasks: Arc<Mutex<Vec<Task>>>,
    pub find_calls: Arc<AtomicUsize>,
    pub batch_calls: Arc<AtomicUsize>,
}

impl MockTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current store contents.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().clone()
    }

    fn make_task(user_email: &str, draft: TaskDraft) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4().to_string(),
            user_email: user_email.to_string(),
            title: draft.title,
            source: draft.source,
            scheduled_date: draft.scheduled_date,
            scheduled_time: draft.scheduled_time,
            priority: draft.priority,
            estimated_minutes: draft.estimated_minutes,
            actual_minutes: draft.actual_minutes,
            is_done: draft.is_done,
            completed_at: None,
            google_calendar_id: draft.google_calendar_id,
            google_event_id: draft.google_event_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(task: &mut Task, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(source) = patch.source {
            task.source = source;
        }
        if let Some(date) = patch.scheduled_date {
            task.scheduled_date = date;
        }
        if let Some(time) = patch.scheduled_time {
            task.scheduled_time = time;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(minutes) = patch.estimated_minutes {
            task.estimated_minutes = minutes;
        }
        if let Some(minutes) = patch.actual_minutes {
            task.actual_minutes = minutes;
        }
        if let Some(done) = patch.is_done {
            task.is_done = done;
            if patch.completed_at.is_none() {
                task.completed_at = done.then_some(Utc::now());
            }
        }
        if let Some(completed) = patch.completed_at {
            task.completed_at = completed;
        }
        if let Some(calendar_id) = &patch.google_calendar_id {
            task.google_calendar_id = calendar_id.clone();
        }
        if let Some(event_id) = &patch.google_event_id {
            task.google_event_id = event_id.clone();
        }
        task.updated_at = Utc::now();
    }
}

#[async_trait]
impl TaskRepository for MockTaskRepository {
    async fn find_by_external_ids(
        &self,
        user_email: &str,
        calendar_id: &str,
        ids: &[String],
    ) -> DomainResult<Vec<Task>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| {
                t.user_email == user_email
                    && t.google_calendar_id.as_deref() == Some(calendar_id)
                    && t.google_event_id
                        .as_ref()
                        .is_some_and(|eid| ids.contains(eid))
            })
            .cloned()
            .collect())
    }

    async fn upsert_batch(
        &self,
        user_email: &str,
        creates: Vec<TaskDraft>,
        updates: Vec<(String, TaskPatch)>,
    ) -> DomainResult<usize> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let mut tasks = self.tasks.lock().unwrap();
        for (task_id, _) in &updates {
            if !tasks.iter().any(|t| &t.id == task_id) {
                return Err(SyncError::NotFound(format!("task {task_id}")));
            }
        }
        let count = creates.len() + updates.len();
        for draft in creates {
            tasks.push(Self::make_task(user_email, draft));
        }
        for (task_id, patch) in updates {
            if let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) {
                Self::apply_patch(task, &patch);
            }
        }
        Ok(count)
    }

    async fn list_in_range(
        &self,
        user_email: &str,
        start: NaiveDate,
        end: NaiveDate,
        include_unscheduled: bool,
    ) -> DomainResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| {
                t.user_email == user_email
                    && match t.scheduled_date {
                        Some(date) => date >= start && date <= end,
                        None => include_unscheduled,
                    }
            })
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            (a.scheduled_date, a.scheduled_time, a.created_at)
                .cmp(&(b.scheduled_date, b.scheduled_time, b.created_at))
        });
        Ok(tasks)
    }

    async fn get(&self, user_email: &str, task_id: &str) -> DomainResult<Task> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.user_email == user_email && t.id == task_id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("task {task_id}")))
    }

    async fn create(&self, user_email: &str, draft: TaskDraft) -> DomainResult<Task> {
        let task = Self::make_task(user_email, draft);
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn update(
        &self,
        user_email: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> DomainResult<Task> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.user_email == user_email && t.id == task_id)
            .ok_or_else(|| SyncError::NotFound(format!("task {task_id}")))?;
        Self::apply_patch(task, &patch);
        Ok(task.clone())
    }

    async fn delete(&self, user_email: &str, task_id: &str) -> DomainResult<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| !(t.user_email == user_email && t.id == task_id));
        if tasks.len() == before {
            return Err(SyncError::NotFound(format!("task {task_id}")));
        }
        Ok(())
    }
}

/// In-memory mock for `SettingsRepository`.
#[derive(Default, Clone)]
pub struct MockSettingsRepository {
    timezones: Arc<Mutex<HashMap<String, String>>>,
}

impl MockSettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timezone(self, user_email: &str, timezone: &str) -> Self {
        self.timezones
            .lock()
            .unwrap()
            .insert(user_email.to_string(), timezone.to_string());
        self
    }
}

#[async_trait]
impl SettingsRepository for MockSettingsRepository {
    async fn get_user_timezone(&self, user_email: &str) -> DomainResult<Option<String>> {
        Ok(self.timezones.lock().unwrap().get(user_email).cloned())
    }

    async fn set_user_timezone(&self, user_email: &str, timezone: &str) -> DomainResult<()> {
        self.timezones
            .lock()
            .unwrap()
            .insert(user_email.to_string(), timezone.to_string());
        Ok(())
    }
}
