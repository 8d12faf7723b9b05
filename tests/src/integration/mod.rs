//! Cross-peer scenarios.

pub mod pull;
pub mod push;
pub mod search;
