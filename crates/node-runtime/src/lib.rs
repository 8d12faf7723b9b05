//! # Danutella Node Runtime
//!
//! Bootstraps one Danutella peer.
//!
//! ## Modular Structure
//!
//! - `config` - Environment and TOML config loading
//! - `runtime` - Wires the peer to its adapters and owns the background tasks
//! - `cli` - The interactive `danutella-<port>>` prompt
//! - `fixtures` - Generates sample owned files for a local test network
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`DN_CONFIG` file, then environment overrides)
//! 2. Create the storage directories and register every owned file
//! 3. Start the TCP listener
//! 4. Start the lazy poller (pull mode only)
//! 5. Run the prompt until `exit` or Ctrl+C
//! 6. Signal shutdown and wait for the tasks

pub mod cli;
pub mod config;
pub mod fixtures;
pub mod runtime;

pub use cli::{Command, CommandError};
pub use config::{load_config, load_config_from};
pub use runtime::{NodeRuntime, Peer};
