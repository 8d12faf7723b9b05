//! # Domain Errors
//!
//! Failures reported to the immediate caller. Protocol filtering (own
//! message, duplicate, stale version, unknown upstream) is not an error and
//! is reported as a [`super::Delivery`] instead.

use thiserror::Error;

use crate::ports::{NetworkError, StoreError};

/// Errors surfaced by peer operations.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The operation needs the origin copy, and this node has a replica.
    #[error("Not the owner of {filename}")]
    NotOwner {
        /// File the caller tried to act on
        filename: String,
    },

    /// No record for this file exists at this node.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// A record exists but is not currently valid, so it may not be served.
    #[error("File {0} is not in a servable state")]
    NotServable(String),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// A request/response call to another peer failed.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

/// Result type for peer operations.
pub type PeerResult<T> = Result<T, PeerError>;
