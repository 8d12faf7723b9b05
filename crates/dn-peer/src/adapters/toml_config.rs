//! # TOML Configuration
//!
//! Loads a [`NodeConfig`] from a file. Every key is optional; missing keys
//! keep their defaults.

use serde::Deserialize;
use shared_types::PeerId;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{
    parse_peer_id, ConfigError, ConsistencyMode, NodeConfig, MAX_POLL_INTERVAL, MIN_POLL_INTERVAL,
};

/// Configuration file structure.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    peer: PeerSection,
    #[serde(default)]
    search: SearchSection,
    #[serde(default)]
    consistency: ConsistencySection,
    #[serde(default)]
    storage: StorageSection,
    #[serde(default)]
    network: NetworkSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PeerSection {
    address: Option<String>,
    port: Option<u16>,
    #[serde(default)]
    neighbors: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchSection {
    default_ttl: Option<u32>,
    message_cache_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConsistencySection {
    mode: Option<ConsistencyMode>,
    default_ttr_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StorageSection {
    owned_dir: Option<PathBuf>,
    replica_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NetworkSection {
    io_timeout_ms: Option<u64>,
}

/// TOML-based configuration provider.
///
/// # Config File Format
///
/// ```toml
/// [peer]
/// address = "localhost"
/// port = 8001
/// neighbors = ["localhost:8002", "localhost:8003"]
///
/// [search]
/// default_ttl = 5
/// message_cache_size = 10
///
/// [consistency]
/// mode = "pull"
/// default_ttr_ms = 60000
/// poll_interval_ms = 15000
///
/// [storage]
/// owned_dir = "myfiles"
/// replica_dir = "otherfiles"
///
/// [network]
/// io_timeout_ms = 5000
/// ```
#[derive(Debug, Clone)]
pub struct TomlConfigProvider {
    config: NodeConfig,
}

impl TomlConfigProvider {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut config = NodeConfig::default();

        if let Some(address) = file.peer.address {
            let port = file.peer.port.unwrap_or(config.identity.local.port());
            config.identity.local = PeerId::new(address, port);
        } else if let Some(port) = file.peer.port {
            config.identity.local = PeerId::localhost(port);
        }
        config.identity.neighbors = file
            .peer
            .neighbors
            .iter()
            .map(|n| parse_peer_id(n))
            .collect::<Result<_, _>>()?;

        let sc = file.search;
        config.search.default_ttl = sc.default_ttl.unwrap_or(config.search.default_ttl);
        if let Some(size) = sc.message_cache_size {
            if size == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "search.message_cache_size",
                    reason: "must be at least 1".to_string(),
                });
            }
            config.search.message_cache_size = size;
        }

        let cc = file.consistency;
        config.consistency.mode = cc.mode.unwrap_or(config.consistency.mode);
        if let Some(ms) = cc.default_ttr_ms {
            config.consistency.default_ttr = Duration::from_millis(ms);
        }
        if let Some(ms) = cc.poll_interval_ms {
            let interval = Duration::from_millis(ms);
            if !(MIN_POLL_INTERVAL..=MAX_POLL_INTERVAL).contains(&interval) {
                return Err(ConfigError::InvalidValue {
                    field: "consistency.poll_interval_ms",
                    reason: format!(
                        "must be between {} and {}",
                        MIN_POLL_INTERVAL.as_millis(),
                        MAX_POLL_INTERVAL.as_millis()
                    ),
                });
            }
            config.consistency.poll_interval = interval;
        }

        let st = file.storage;
        if let Some(dir) = st.owned_dir {
            config.storage.owned_dir = dir;
        }
        if let Some(dir) = st.replica_dir {
            config.storage.replica_dir = dir;
        }

        if let Some(ms) = file.network.io_timeout_ms {
            config.network.io_timeout = Duration::from_millis(ms);
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn into_config(self) -> NodeConfig {
        self.config
    }
}
