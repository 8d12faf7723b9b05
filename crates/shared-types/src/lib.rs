//! # Shared Types Crate
//!
//! Value types every Danutella crate agrees on.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identity and wire types live here and only here.
//! - **Structural Identity**: `PeerId` and `MessageId` compare by value; peers
//!   refer to each other only through these keys.
//! - **Transport Agnostic**: the wire messages are plain serde types. Framing
//!   and encoding belong to the transport adapter.

pub mod entities;
pub mod ipc;

pub use entities::*;
pub use ipc::*;
