//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `TANDEM_DB_PATH`: Database file path
//! - `TANDEM_DB_POOL_SIZE`: Connection pool size (optional, default 5)
//! - `TANDEM_GOOGLE_CLIENT_ID`: OAuth client id
//! - `TANDEM_GOOGLE_CLIENT_SECRET`: OAuth client secret
//! - `TANDEM_TOKEN_ENCRYPTION_KEY`: Secret the credential sealing key is derived from
//! - `TANDEM_GOOGLE_TOKEN_ENDPOINT`: Token endpoint override (optional)
//! - `TANDEM_GOOGLE_API_BASE_URL`: Calendar API base override (optional)
//! - `TANDEM_HTTP_TIMEOUT_SECS`: HTTP timeout override (optional)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./tandem.json` or `./tandem.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)

use std::path::{Path, PathBuf};

use tandem_domain::{
    Config, DatabaseConfig, GoogleCalendarConfig, Result, SyncError, HTTP_TIMEOUT_SECS,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `SyncError::Config` if configuration cannot be loaded from
/// either source.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `SyncError::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("TANDEM_DB_PATH")?;
    let pool_size = match std::env::var("TANDEM_DB_POOL_SIZE") {
        Ok(raw) => raw
            .parse::<u32>()
            .map_err(|e| SyncError::Config(format!("invalid pool size: {e}")))?,
        Err(_) => DatabaseConfig::default().pool_size,
    };

    let client_id = env_var("TANDEM_GOOGLE_CLIENT_ID")?;
    let client_secret = env_var("TANDEM_GOOGLE_CLIENT_SECRET")?;
    let token_encryption_key = env_var("TANDEM_TOKEN_ENCRYPTION_KEY")?;

    let mut google = GoogleCalendarConfig::new(client_id, client_secret, token_encryption_key);
    if let Ok(endpoint) = std::env::var("TANDEM_GOOGLE_TOKEN_ENDPOINT") {
        google.token_endpoint = endpoint;
    }
    if let Ok(base) = std::env::var("TANDEM_GOOGLE_API_BASE_URL") {
        google.api_base_url = base;
    }
    if let Ok(raw) = std::env::var("TANDEM_HTTP_TIMEOUT_SECS") {
        google.http_timeout_secs = raw
            .parse::<u64>()
            .map_err(|e| SyncError::Config(format!("invalid http timeout: {e}")))?;
    }
    if google.http_timeout_secs == 0 {
        google.http_timeout_secs = HTTP_TIMEOUT_SECS;
    }

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size },
        google,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SyncError::Config` if no file is found or the contents are
/// invalid.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SyncError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SyncError::Config("no config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SyncError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Probe the standard locations for a config file.
pub fn probe_config_paths() -> Option<PathBuf> {
    let candidates = [
        "config.json",
        "config.toml",
        "tandem.json",
        "tandem.toml",
        "../config.json",
        "../config.toml",
    ];
    candidates
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    if is_toml {
        toml::from_str(contents)
            .map_err(|e| SyncError::Config(format!("invalid TOML config: {e}")))
    } else {
        serde_json::from_str(contents)
            .map_err(|e| SyncError::Config(format!("invalid JSON config: {e}")))
    }
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| SyncError::Config(format!("missing environment variable: {name}")))
}
