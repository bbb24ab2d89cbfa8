use minewatch_core::MinewatchError;
use std::net::SocketAddr;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8787";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub addr: SocketAddr,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl ApiConfig {
    /// Read `MINEWATCH_ADDR` and `MINEWATCH_LOG`.
    pub fn from_env() -> Result<Self, MinewatchError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MinewatchError> {
        let raw_addr = lookup("MINEWATCH_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| MinewatchError::ConfigError(format!("MINEWATCH_ADDR {:?}: {}", raw_addr, e)))?;

        let log_filter = lookup("MINEWATCH_LOG")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self { addr, log_filter })
    }
}
