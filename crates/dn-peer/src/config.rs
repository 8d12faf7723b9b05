//! # Node Configuration
//!
//! Protocol parameters for a single peer. All values have the defaults the
//! network was designed around; a TOML file can override them (see
//! `adapters::toml_config`, feature `config`).

use serde::Deserialize;
use shared_types::PeerId;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default number of hops for queries and hits.
pub const DEFAULT_TTL: u32 = 5;

/// Default capacity of the message dedup cache.
pub const DEFAULT_MESSAGE_CACHE_SIZE: usize = 10;

/// Default time-to-refresh handed out by origins.
pub const DEFAULT_TTR: Duration = Duration::from_secs(60);

/// Default lazy-poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Shortest lazy-poll period a config file may set.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Longest lazy-poll period a config file may set.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Complete peer configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// This peer and its neighbours.
    pub identity: IdentityConfig,
    /// Flooding search parameters.
    pub search: SearchConfig,
    /// Replica consistency parameters.
    pub consistency: ConsistencyConfig,
    /// Local directories.
    pub storage: StorageConfig,
    /// Transport timeouts.
    pub network: NetworkConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            search: SearchConfig::default(),
            consistency: ConsistencyConfig::default(),
            storage: StorageConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create a config for testing (short TTR and poll period).
    pub fn for_testing() -> Self {
        Self {
            consistency: ConsistencyConfig {
                mode: ConsistencyMode::Push,
                default_ttr: Duration::from_millis(1_000),
                poll_interval: Duration::from_millis(100),
            },
            network: NetworkConfig {
                io_timeout: Duration::from_millis(500),
            },
            ..Default::default()
        }
    }

    /// Builder method: set consistency mode.
    pub fn with_mode(mut self, mode: ConsistencyMode) -> Self {
        self.consistency.mode = mode;
        self
    }

    /// Builder method: set identity and neighbours.
    pub fn with_identity(mut self, local: PeerId, neighbors: Vec<PeerId>) -> Self {
        self.identity = IdentityConfig { local, neighbors };
        self
    }
}

/// Who this peer is and whom it talks to. Neighbours are fixed for the
/// lifetime of the process.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub local: PeerId,
    pub neighbors: Vec<PeerId>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            local: PeerId::localhost(8000),
            neighbors: Vec::new(),
        }
    }
}

/// Flooding search configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Hop budget for new queries and for hit replies.
    pub default_ttl: u32,
    /// Capacity of the message dedup cache shared by search and invalidation.
    pub message_cache_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            message_cache_size: DEFAULT_MESSAGE_CACHE_SIZE,
        }
    }
}

/// Which consistency protocol the node runs. Chosen once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyMode {
    /// Origins broadcast invalidations on edit.
    #[default]
    Push,
    /// Replicas poll their origin when their TTR expires.
    Pull,
}

impl fmt::Display for ConsistencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::Pull => write!(f, "pull"),
        }
    }
}

impl FromStr for ConsistencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "push" => Ok(Self::Push),
            "pull" => Ok(Self::Pull),
            other => Err(format!("unknown consistency mode '{other}' (expected push|pull)")),
        }
    }
}

/// Parses `address:port` into a [`PeerId`]. A bare port means localhost.
pub fn parse_peer_id(s: &str) -> Result<PeerId, ConfigError> {
    let s = s.trim();
    let (address, port) = match s.rsplit_once(':') {
        Some((address, port)) if !address.is_empty() => (address, port),
        Some(_) => return Err(ConfigError::InvalidPeer(s.to_string())),
        None => (PeerId::DEFAULT_ADDRESS, s),
    };
    let port = port
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPeer(s.to_string()))?;
    Ok(PeerId::new(address, port))
}

/// Errors that can occur during config loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },
    /// TOML parsing error.
    #[error("Failed to parse config: {0}")]
    Parse(String),
    /// A peer address that is not `address:port`.
    #[error("Invalid peer address: {0}")]
    InvalidPeer(String),
    /// A value outside its allowed range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

/// Consistency configuration.
#[derive(Debug, Clone)]
pub struct ConsistencyConfig {
    pub mode: ConsistencyMode,
    /// TTR an origin hands to replicas that are still current.
    pub default_ttr: Duration,
    /// Lazy-poll period (pull mode only). Config files are held to
    /// [`MIN_POLL_INTERVAL`]..=[`MAX_POLL_INTERVAL`]; `for_testing()` is not.
    pub poll_interval: Duration,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            mode: ConsistencyMode::default(),
            default_ttr: DEFAULT_TTR,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Files this peer is origin for.
    pub owned_dir: PathBuf,
    /// Files downloaded from other peers.
    pub replica_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            owned_dir: PathBuf::from("myfiles"),
            replica_dir: PathBuf::from("otherfiles"),
        }
    }
}

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Connect/read/write timeout for a single call.
    pub io_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            io_timeout: Duration::from_secs(5),
        }
    }
}
