//! Configuration for the boardlink bridge.
//!
//! Everything comes from the environment; the bridge deliberately has no
//! CLI flags. Precedence is env var, then default (where one exists).

use std::path::PathBuf;

const DEFAULT_API_URL: &str = "https://lichess.org";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the Board API.
    pub token: String,
    /// Path to the device node (e.g. /dev/ttyUSB0).
    pub device: PathBuf,
    /// Check-signal policy: true = signal when either side is in check,
    /// false = only when it is our turn and we are in check.
    pub any_check: bool,
    /// Base URL of the Board API.
    pub api_url: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `BOARDLINK_TOKEN` and `BOARDLINK_DEVICE` are required;
    /// `BOARDLINK_ANY_CHECK` (truthy: "1", "true", "yes") and
    /// `BOARDLINK_API_URL` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var("BOARDLINK_TOKEN")
            .map_err(|_| ConfigError::Missing("BOARDLINK_TOKEN"))?;
        let device = std::env::var("BOARDLINK_DEVICE")
            .map_err(|_| ConfigError::Missing("BOARDLINK_DEVICE"))?;

        Ok(Self {
            token,
            device: PathBuf::from(device),
            any_check: env_truthy("BOARDLINK_ANY_CHECK"),
            api_url: std::env::var("BOARDLINK_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        })
    }
}

fn env_truthy(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
