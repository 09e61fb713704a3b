//! External calendar synchronization engine
//!
//! Keeps the local task store consistent with a third-party calendar
//! service: inbound reconciliation (provider is the source of truth) and
//! outbound mutation (local edits pushed to the provider), with idempotent
//! upserts and fail-closed ordering on deletes.

pub mod mapper;
pub mod outbound;
pub mod ports;
pub mod reconciler;
pub mod service;

pub use outbound::OutboundMutator;
pub use ports::{CalendarTransport, CredentialRepository};
pub use reconciler::InboundReconciler;
pub use service::{CalendarSyncService, TaskListing};
