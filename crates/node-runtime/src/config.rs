//! # Node Configuration
//!
//! A TOML file named by `DN_CONFIG` (optional), then single-value overrides
//! from the environment.

use anyhow::{anyhow, Context, Result};
use dn_peer::adapters::TomlConfigProvider;
use dn_peer::{parse_peer_id, ConsistencyMode, NodeConfig, PeerId};

/// Path of the TOML config file.
pub const CONFIG_ENV: &str = "DN_CONFIG";
/// Listen port, overriding `peer.port`.
pub const PORT_ENV: &str = "DN_PORT";
/// Comma-separated neighbour list, overriding `peer.neighbors`.
pub const NEIGHBORS_ENV: &str = "DN_NEIGHBORS";
/// `push` or `pull`.
pub const MODE_ENV: &str = "DN_CONSISTENCY_MODE";

/// Load configuration from the process environment.
pub fn load_config() -> Result<NodeConfig> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load configuration, reading variables through `lookup`.
pub fn load_config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<NodeConfig> {
    let mut config = match lookup(CONFIG_ENV) {
        Some(path) => TomlConfigProvider::load(&path)
            .with_context(|| format!("Failed to load config from {path}"))?
            .into_config(),
        None => NodeConfig::default(),
    };

    if let Some(port) = lookup(PORT_ENV) {
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("{PORT_ENV} must be a port number, got {port:?}"))?;
        let address = config.identity.local.address().to_string();
        config.identity.local = PeerId::new(address, port);
    }

    if let Some(neighbors) = lookup(NEIGHBORS_ENV) {
        config.identity.neighbors = neighbors
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(parse_peer_id)
            .collect::<Result<_, _>>()
            .with_context(|| format!("Invalid {NEIGHBORS_ENV}"))?;
    }

    if let Some(mode) = lookup(MODE_ENV) {
        config.consistency.mode = mode
            .parse::<ConsistencyMode>()
            .map_err(|e| anyhow!("Invalid {MODE_ENV}: {e}"))?;
    }

    Ok(config)
}
