//! Environment-driven configuration
//!
//! Values come from the process environment after `.env` has been loaded.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::utils::encryption;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
    #[error("{var} must be a number of milliseconds, got '{value}'")]
    InvalidDuration { var: &'static str, value: String },
    #[error("TXN_SESSION_KEY is invalid: {0}")]
    InvalidSessionKey(#[from] encryption::CryptoError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub stream_path: String,
    pub session_file: PathBuf,
    pub session_key: Option<[u8; 32]>,
    pub timings: Timings,
}

/// Timer settings for the live channel and the notification feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub reconnect_delay: Duration,
    pub heartbeat_interval: Duration,
    pub notification_ttl: Duration,
    pub refetch_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(3000),
            heartbeat_interval: Duration::from_millis(30000),
            notification_ttl: Duration::from_millis(5000),
            refetch_delay: Duration::from_millis(500),
        }
    }
}

impl Config {
    const DEFAULT_API_URL: &'static str = "http://localhost:8000";
    const DEFAULT_STREAM_PATH: &'static str = "/api/transactions/stream";
    const DEFAULT_SESSION_FILE: &'static str = ".txn_session";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so tests don't touch the process env
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("TXN_API_URL").unwrap_or_else(|| Self::DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&raw_url).map_err(|e| ConfigError::InvalidUrl {
            var: "TXN_API_URL",
            reason: e.to_string(),
        })?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                var: "TXN_API_URL",
                reason: format!("unsupported scheme '{}'", api_url.scheme()),
            });
        }

        let stream_path = lookup("TXN_STREAM_PATH")
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_STREAM_PATH.to_string());

        let session_file = lookup("TXN_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_SESSION_FILE));

        let session_key = match lookup("TXN_SESSION_KEY").filter(|k| !k.is_empty()) {
            Some(hex) => Some(encryption::parse_key(&hex)?),
            None => None,
        };

        let defaults = Timings::default();
        let timings = Timings {
            reconnect_delay: millis(&lookup, "TXN_RECONNECT_DELAY_MS", defaults.reconnect_delay)?,
            heartbeat_interval: millis(&lookup, "TXN_HEARTBEAT_MS", defaults.heartbeat_interval)?,
            notification_ttl: millis(&lookup, "TXN_NOTIFICATION_TTL_MS", defaults.notification_ttl)?,
            refetch_delay: millis(&lookup, "TXN_REFETCH_DELAY_MS", defaults.refetch_delay)?,
        };

        Ok(Self {
            api_url,
            stream_path,
            session_file,
            session_key,
            timings,
        })
    }
}

fn millis<F>(lookup: &F, var: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .ok_or(ConfigError::InvalidDuration { var, value }),
    }
}
