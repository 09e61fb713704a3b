//! Application constants
//!
//! Centralized location for domain-level constants used by the sync engine.

/// Timezone applied when a user has not configured one.
pub const DEFAULT_TIME_ZONE: &str = "America/Sao_Paulo";

/// Cached access credentials with less remaining validity than this are
/// refreshed rather than returned.
pub const ACCESS_TOKEN_EXPIRY_SLACK_SECS: i64 = 60;

/// Event duration assumed when a task carries no estimate.
pub const DEFAULT_EVENT_DURATION_MINUTES: i64 = 30;

/// Title substituted for events the provider returns without a summary.
pub const UNTITLED_EVENT_PLACEHOLDER: &str = "(no title)";

/// Calendar used when a task does not name one explicitly.
pub const PRIMARY_CALENDAR_ID: &str = "primary";

/// Page size requested from the provider's event listing endpoint.
pub const EVENTS_PAGE_SIZE: u32 = 250;

/// Timeout applied to every outbound HTTP call.
pub const HTTP_TIMEOUT_SECS: u64 = 15;
