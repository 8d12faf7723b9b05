//! # Peer Service
//!
//! The orchestrator that owns a node's protocol state and implements
//! [`crate::ports::PeerApi`] on top of the outbound ports.
//!
//! ## Module Structure
//!
//! - `core` - Service struct, state, fan-out helpers
//! - `search` - `get`, `on_query`, `on_hit_query`
//! - `push` - `edit`, `on_invalidate`
//! - `pull` - `on_poll`, `lazy_poll`
//! - `files` - `obtain`, downloads, refresh, listing
//! - `api` - Trait implementation

mod api;
mod core;
mod files;
mod pull;
mod push;
mod search;


pub use self::core::PeerService;
