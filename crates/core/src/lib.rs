//! # Tandem Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the task store, settings store,
//!   credential store, and calendar transport
//! - The event/task mapper, inbound reconciler, and outbound mutator
//! - The `CalendarSyncService` facade exposed to request handlers
//!
//! ## Architecture Principles
//! - Only depends on `tandem-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod calendar;
pub mod tasks;

// Re-export specific items to avoid ambiguity
pub use calendar::mapper;
pub use calendar::outbound::OutboundMutator;
pub use calendar::ports::{CalendarTransport, CredentialRepository};
pub use calendar::reconciler::InboundReconciler;
pub use calendar::service::{CalendarSyncService, TaskListing};
pub use tasks::ports::{SettingsRepository, TaskRepository};
