//! Settings loaded from environment variables.

use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// How to reach the scheduling backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    /// Attempts per config sync, at least 1
    pub sync_attempts: u32,
    /// Delay before the first sync retry; doubles on each further retry
    pub sync_backoff: Duration,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            sync_attempts: 3,
            sync_backoff: Duration::from_millis(200),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// Reads a `.env` file if present. Unset variables keep their defaults:
    /// `EXAMGRID_API_URL`, `EXAMGRID_SYNC_ATTEMPTS`, `EXAMGRID_SYNC_BACKOFF_MS`,
    /// `EXAMGRID_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let api_url = lookup("EXAMGRID_API_URL").unwrap_or(defaults.api_url);

        let sync_attempts = match lookup("EXAMGRID_SYNC_ATTEMPTS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("EXAMGRID_SYNC_ATTEMPTS is not a number: {v}"))?
                .max(1),
            None => defaults.sync_attempts,
        };

        let sync_backoff = match lookup("EXAMGRID_SYNC_BACKOFF_MS") {
            Some(v) => Duration::from_millis(
                v.trim()
                    .parse()
                    .with_context(|| format!("EXAMGRID_SYNC_BACKOFF_MS is not a number: {v}"))?,
            ),
            None => defaults.sync_backoff,
        };

        let request_timeout = match lookup("EXAMGRID_REQUEST_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.trim().parse().with_context(|| {
                    format!("EXAMGRID_REQUEST_TIMEOUT_SECS is not a number: {v}")
                })?,
            ),
            None => defaults.request_timeout,
        };

        Ok(Self {
            api_url,
            sync_attempts,
            sync_backoff,
            request_timeout,
        })
    }
}
