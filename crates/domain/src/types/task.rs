//! Local task records and the draft/patch shapes used for store writes.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin of a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskSource {
    /// Created by the user in the dashboard.
    Manual,
    /// Created or overwritten by the inbound calendar reconciler.
    Google,
}

impl Default for TaskSource {
    fn default() -> Self {
        Self::Manual
    }
}

impl TaskSource {
    /// Database/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Google => "google",
        }
    }

    /// Parse the database representation; unknown values default to manual.
    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "google" => Self::Google,
            _ => Self::Manual,
        }
    }
}

/// Task priority tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    /// Database/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Parse the database representation; unknown values default to medium.
    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "Low" => Self::Low,
            "High" => Self::High,
            "Critical" => Self::Critical,
            _ => Self::Medium,
        }
    }
}

/// A durable local task.
///
/// A task with a non-null `google_event_id` is "linked": at most one task per
/// (owner, event id) pair may exist, and its external fields are only written
/// by the sync engine after a confirmed external mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_email: String,
    pub title: String,
    pub source: TaskSource,
    pub scheduled_date: Option<NaiveDate>,
    /// None means all-day or unscheduled.
    pub scheduled_time: Option<NaiveTime>,
    pub priority: TaskPriority,
    pub estimated_minutes: Option<i64>,
    pub actual_minutes: Option<i64>,
    pub is_done: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub google_calendar_id: Option<String>,
    pub google_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether this task is linked to an external calendar event.
    pub fn is_linked(&self) -> bool {
        self.google_event_id.is_some()
    }
}

/// Fields for creating a task. Ids and timestamps are assigned by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub source: TaskSource,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub priority: TaskPriority,
    pub estimated_minutes: Option<i64>,
    pub actual_minutes: Option<i64>,
    pub is_done: bool,
    pub google_calendar_id: Option<String>,
    pub google_event_id: Option<String>,
}

/// Partial update for a task.
///
/// Outer `None` leaves a field unchanged; for nullable fields the inner
/// option distinguishes "set to null" from "set to a value".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub source: Option<TaskSource>,
    pub scheduled_date: Option<Option<NaiveDate>>,
    pub scheduled_time: Option<Option<NaiveTime>>,
    pub priority: Option<TaskPriority>,
    pub estimated_minutes: Option<Option<i64>>,
    pub actual_minutes: Option<Option<i64>>,
    pub is_done: Option<bool>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub google_calendar_id: Option<Option<String>>,
    pub google_event_id: Option<Option<String>>,
}

impl TaskPatch {
    /// True when no field is being changed.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.source.is_none()
            && self.scheduled_date.is_none()
            && self.scheduled_time.is_none()
            && self.priority.is_none()
            && self.estimated_minutes.is_none()
            && self.actual_minutes.is_none()
            && self.is_done.is_none()
            && self.completed_at.is_none()
            && self.google_calendar_id.is_none()
            && self.google_event_id.is_none()
    }
}
