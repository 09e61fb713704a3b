//! Google Calendar integration
//!
//! Token lifecycle (sealed refresh credentials, cached access credentials,
//! single-flight refresh) and the HTTP transport implementing the
//! `CalendarTransport` port.

pub mod classify;
pub mod client;
pub mod token_manager;

pub use classify::{classify_auth_failure, AuthFailure};
pub use client::GoogleCalendarClient;
pub use token_manager::{AccessToken, TokenManager};
