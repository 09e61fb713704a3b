//! Domain data types for tasks and external calendar state.

pub mod calendar;
pub mod task;

pub use calendar::{
    CalendarCredential, EventDraft, EventDraftTime, EventPatch, EventTime, ExternalEvent,
    SyncWindow,
};
pub use task::{Task, TaskDraft, TaskPatch, TaskPriority, TaskSource};
