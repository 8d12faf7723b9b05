//! Domain Layer - Pure protocol state with no I/O
//!
//! - Replica records and derived TTR state
//! - The shared message dedup cache
//! - The pending-search set
//! - The replica table and download merge rules
//! - Poll and refresh reports

pub mod delivery;
pub mod entities;
pub mod errors;
pub mod message_cache;
pub mod pending;
pub mod replicas;
pub mod reports;

pub use delivery::*;
pub use entities::*;
pub use errors::*;
pub use message_cache::*;
pub use pending::*;
pub use replicas::*;
pub use reports::*;
