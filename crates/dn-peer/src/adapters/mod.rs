//! Adapters Layer - Concrete implementations of the ports
//!
//! - `time` - System clock (always available)
//! - `codec`, `tcp`, `listener` - TCP transport (`network` feature)
//! - `fs_store` - Directory-backed file storage (`storage` feature)
//! - `toml_config` - Config file loading (`config` feature)

pub mod time;

#[cfg(feature = "network")]
pub mod codec;
#[cfg(feature = "network")]
pub mod listener;
#[cfg(feature = "network")]
pub mod tcp;

#[cfg(feature = "storage")]
pub mod fs_store;

#[cfg(feature = "config")]
pub mod toml_config;

pub use time::SystemTimeSource;

#[cfg(feature = "network")]
pub use listener::PeerListener;
#[cfg(feature = "network")]
pub use tcp::TcpPeerNetwork;

#[cfg(feature = "storage")]
pub use fs_store::FsFileStore;

#[cfg(feature = "config")]
pub use toml_config::TomlConfigProvider;
