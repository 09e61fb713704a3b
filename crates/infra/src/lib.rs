//! # Tandem Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite-backed repositories (tasks, credentials, settings)
//! - The Google Calendar HTTP transport and token lifecycle
//! - Configuration loading from environment variables and files
//!
//! ## Architecture
//! - Implements traits defined in `tandem-core`
//! - Depends on `tandem-common`, `tandem-domain`, and `tandem-core`
//! - Contains all "impure" code (I/O, network)

pub mod config;
pub mod database;
pub mod errors;
pub mod google;

// Re-export commonly used items
pub use database::{
    DbManager, SqliteCredentialRepository, SqliteSettingsRepository, SqliteTaskRepository,
};
pub use errors::InfraError;
pub use google::{GoogleCalendarClient, TokenManager};
