//! # Danutella Test Suite
//!
//! Multi-peer scenarios.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── simulation.rs     # In-process network routing messages between peers
//! └── integration/
//!     ├── search.rs     # Flooding search and hit back-tracing
//!     ├── push.rs       # Invalidation floods
//!     ├── pull.rs       # TTR expiry and lazy polling
//!     └── transport.rs  # Real TCP between peers on localhost
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dn-tests
//! cargo test -p dn-tests integration::push::
//! ```

pub mod integration;
pub mod simulation;
