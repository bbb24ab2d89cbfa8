use minewatch_core::MinewatchError;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;
pub const DEFAULT_STATUS_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Backend API root, without the `/python/analysis` suffix
    pub base_url: String,
    pub interval: Duration,
    /// Delay before the first status request
    pub initial_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STATUS_BASE_URL.to_string(),
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
        }
    }
}

fn millis_var(name: &str, value: Option<String>, default: u64) -> Result<Duration, MinewatchError> {
    match value {
        None => Ok(Duration::from_millis(default)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| MinewatchError::ConfigError(format!("{} must be milliseconds, got {:?}", name, raw))),
    }
}

impl PollConfig {
    /// Read `MINEWATCH_STATUS_BASE_URL`, `MINEWATCH_POLL_INTERVAL_MS` and
    /// `MINEWATCH_POLL_INITIAL_DELAY_MS`, defaulting what is unset.
    pub fn from_env() -> Result<Self, MinewatchError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MinewatchError> {
        let base_url = lookup("MINEWATCH_STATUS_BASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATUS_BASE_URL.to_string());

        let interval = millis_var(
            "MINEWATCH_POLL_INTERVAL_MS",
            lookup("MINEWATCH_POLL_INTERVAL_MS"),
            DEFAULT_POLL_INTERVAL_MS,
        )?;
        if interval.is_zero() {
            return Err(MinewatchError::ConfigError(
                "MINEWATCH_POLL_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }

        let initial_delay = millis_var(
            "MINEWATCH_POLL_INITIAL_DELAY_MS",
            lookup("MINEWATCH_POLL_INITIAL_DELAY_MS"),
            DEFAULT_INITIAL_DELAY_MS,
        )?;

        Ok(Self { base_url, interval, initial_delay })
    }
}
