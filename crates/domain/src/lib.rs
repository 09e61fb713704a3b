//! # Tandem Domain
//!
//! Business domain types and models for the Tandem calendar sync engine.
//!
//! This crate contains:
//! - Domain data types (Task, ExternalEvent, CalendarCredential, ...)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Tandem crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use constants::*;
pub use errors::*;
pub use types::*;
