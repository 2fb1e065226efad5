//! Remote Transport Port
//!
//! Abstracts the secure-shell channel to a remote account. The domain only
//! needs to connect, run commands, move bytes and close; whether that is the
//! system `ssh` client, a local shell or an in-memory fake is an
//! infrastructure concern.

use std::time::Duration;

use crate::domain::value_objects::{ContentHash, Target};

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport-level failure, without target context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Host unreachable or the channel dropped
    Unreachable(String),
    /// Credentials rejected
    AuthenticationRejected(String),
    /// Remote path does not exist
    NotFound(String),
    /// Remote path exists but cannot be read or written
    Io { path: String, message: String },
    /// Operation exceeded its time budget
    Timeout { operation: String, after: Duration },
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable(msg) => write!(f, "Unreachable: {}", msg),
            Self::AuthenticationRejected(msg) => write!(f, "Authentication rejected: {}", msg),
            Self::NotFound(path) => write!(f, "No such file: {}", path),
            Self::Io { path, message } => write!(f, "I/O error on {}: {}", path, message),
            Self::Timeout { operation, after } => {
                write!(f, "{} timed out after {}s", operation, after.as_secs())
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Exit status and fully drained streams of one remote command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecOutput {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Factory for authenticated connections
///
/// Implementations:
/// - `SshTransport` - system `ssh` client
/// - `LocalTransport` - local shell rooted in a directory
/// - `MemoryTransport` - in-memory hosts for tests
pub trait Transport: Send + Sync {
    /// Name for logging (`ssh`, `local`, `memory`)
    fn name(&self) -> &'static str;

    /// Establish an authenticated channel to `target`
    fn connect(&self, target: &Target, timeout: Duration) -> TransportResult<Box<dyn Connection>>;
}

/// One live channel to one account
///
/// Owned by exactly one session; never shared across threads concurrently.
pub trait Connection: Send {
    /// Run `command` in the account's login shell.
    ///
    /// Returns once the process has exited and both streams are drained.
    fn exec(
        &mut self,
        command: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> TransportResult<ExecOutput>;

    /// Read a whole remote file
    fn read(&mut self, path: &str, timeout: Duration) -> TransportResult<Vec<u8>>;

    /// Create or fully replace a remote file
    fn write(&mut self, path: &str, content: &[u8], timeout: Duration) -> TransportResult<()>;

    /// Size in bytes of a remote file
    fn size(&mut self, path: &str, timeout: Duration) -> TransportResult<u64>;

    /// SHA-256 of a remote file, or `None` if the remote cannot compute one
    fn checksum(&mut self, path: &str, timeout: Duration) -> TransportResult<Option<ContentHash>>;

    /// Release the channel; must be safe to call more than once
    fn close(&mut self);
}
