//! Server configuration from the environment.

use anyhow::Context;
use std::net::SocketAddr;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `SERVER_ADDR`
    pub addr: SocketAddr,
    /// `RUST_LOG`
    pub log_filter: String,
    /// `UNO_SEED`: makes every shuffle reproducible
    pub seed: Option<u64>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.into());
        let addr = raw_addr
            .parse()
            .with_context(|| format!("invalid SERVER_ADDR {:?}", raw_addr))?;

        let log_filter = lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.into());

        let seed = lookup("UNO_SEED")
            .map(|raw| {
                raw.parse::<u64>()
                    .with_context(|| format!("invalid UNO_SEED {:?}", raw))
            })
            .transpose()?;

        Ok(Self {
            addr,
            log_filter,
            seed,
        })
    }
}
