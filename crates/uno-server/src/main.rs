//! Multiplayer UNO game server.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod protocol;
mod registry;
mod server;
mod stats;

use config::ServerConfig;
use registry::SessionRegistry;
use server::ServerState;
use stats::InMemoryStatsStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting UNO server...");

    let registry = match config.seed {
        Some(seed) => {
            info!("Deterministic shuffles with seed {}", seed);
            SessionRegistry::with_seed(seed)
        }
        None => SessionRegistry::new(),
    };
    let state = Arc::new(ServerState::new(registry, Arc::new(InMemoryStatsStore::new())));

    server::run_server(config.addr, state).await
}
