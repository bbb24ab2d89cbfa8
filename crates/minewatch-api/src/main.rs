//! Binary entrypoint for the Minewatch API server.
use anyhow::Context;
use minewatch_api::{run, ApiConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    let state = AppState::new().context("failed to set up metrics registry")?;
    run(config.addr, state)
        .await
        .with_context(|| format!("server on {} stopped", config.addr))
}
