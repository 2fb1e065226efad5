//! Per-operation time budgets for remote calls

use std::time::Duration;

/// Time limits applied to each kind of remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Establishing the authenticated channel
    pub connect: Duration,
    /// One remote command, until both streams are drained
    pub command: Duration,
    /// One file read, write or upload
    pub transfer: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            command: Duration::from_secs(300),
            transfer: Duration::from_secs(120),
        }
    }
}
