//! SQLite-backed persistence
//!
//! Repository implementations of the `tandem-core` store ports, all sharing
//! one r2d2 connection pool.

pub mod credential_repository;
pub mod manager;
pub mod settings_repository;
pub mod task_repository;

pub use credential_repository::SqliteCredentialRepository;
pub use manager::{DbManager, DbPool};
pub use settings_repository::SqliteSettingsRepository;
pub use task_repository::SqliteTaskRepository;
