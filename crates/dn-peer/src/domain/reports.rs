//! Summaries returned by the periodic and on-demand consistency operations.

use std::fmt;

/// Result of one `lazy_poll` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Expired replicas the origin confirmed current.
    pub revalidated: Vec<String>,
    /// Expired replicas the origin reported out of date.
    pub invalidated: Vec<String>,
    /// Polls that failed in transport; the replica stays expired.
    pub failed: Vec<String>,
}

impl PollReport {
    /// Number of polls attempted.
    pub fn polled(&self) -> usize {
        self.revalidated.len() + self.invalidated.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polled() == 0
    }
}

/// Result of a user-requested refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// On-demand poll pass (pull mode only).
    pub poll: PollReport,
    /// Replicas re-downloaded from their origin.
    pub downloaded: Vec<String>,
    /// Re-downloads that failed.
    pub failed: Vec<String>,
}

impl fmt::Display for RefreshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.poll.is_empty() {
            writeln!(
                f,
                "polled {}: {} revalidated, {} invalidated, {} failed",
                self.poll.polled(),
                self.poll.revalidated.len(),
                self.poll.invalidated.len(),
                self.poll.failed.len()
            )?;
        }
        if self.downloaded.is_empty() && self.failed.is_empty() {
            return writeln!(f, "nothing to refresh");
        }
        for name in &self.downloaded {
            writeln!(f, "refreshed {name}")?;
        }
        for name in &self.failed {
            writeln!(f, "could not refresh {name}")?;
        }
        Ok(())
    }
}
