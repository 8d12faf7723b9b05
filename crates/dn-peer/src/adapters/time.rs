use shared_types::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ports::TimeSource;

/// Production time source using the system clock, in milliseconds.
///
/// For testing, use `ManualTimeSource` from the test utilities.
///
/// # Example
///
/// ```rust
/// use dn_peer::adapters::SystemTimeSource;
/// use dn_peer::TimeSource;
///
/// let now = SystemTimeSource::new().now();
/// assert!(now.as_millis() > 0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }
}
