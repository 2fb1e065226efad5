//! Error types for Convoy
//!
//! Uses `thiserror` for library errors. Every variant maps onto an
//! [`ErrorKind`], which is what ends up in a deployment report.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Convoy operations
pub type ConvoyResult<T> = Result<T, ConvoyError>;

/// Main error type for Convoy operations
#[derive(Error, Debug)]
pub enum ConvoyError {
    /// The remote channel could not be established or was lost
    #[error("cannot connect to {target}: {message}")]
    Connection { target: String, message: String },

    /// Credentials were rejected by the remote host
    #[error("authentication rejected for {target}: {message}")]
    Authentication { target: String, message: String },

    /// Remote file is missing, unreadable or unwritable
    #[error("remote I/O error on {path}: {message}")]
    RemoteIo { path: String, message: String },

    /// Uploaded artifact does not match the local source
    #[error("transfer verification failed for {path}: {message}")]
    TransferVerification { path: String, message: String },

    /// Remote command exited non-zero or its streams failed
    #[error("command `{command}` failed{}: {stderr}", exit_suffix(.exit_code))]
    CommandExecution {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// A remote operation exceeded its time budget
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },

    /// Preset name is not registered
    #[error("unknown deployment preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },

    /// Data operation on a session that is not open
    #[error("session for {target} is {state}")]
    SessionClosed { target: String, state: String },

    /// Raw configuration has a malformed value
    #[error("invalid configuration at '{key}': {message}")]
    ConfigValidation { key: String, message: String },

    /// Configuration document could not be parsed
    #[error("cannot parse {file}: {message}")]
    ConfigParse { file: PathBuf, message: String },

    /// Local staging file could not be read or written
    #[error("local I/O error on {path}: {message}")]
    LocalIo { path: PathBuf, message: String },

    /// Deployment was interrupted before this target finished
    #[error("deployment cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => " without an exit code".to_string(),
    }
}

impl ConvoyError {
    /// Shorthand for a validation failure on a dotted config key
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Classify this error for reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::RemoteIo { .. } => ErrorKind::RemoteIo,
            Self::TransferVerification { .. } => ErrorKind::TransferVerification,
            Self::CommandExecution { .. } => ErrorKind::CommandExecution,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::UnknownPreset { .. } => ErrorKind::UnknownPreset,
            Self::SessionClosed { .. } => ErrorKind::SessionClosed,
            Self::ConfigValidation { .. } | Self::ConfigParse { .. } => {
                ErrorKind::ConfigValidation
            }
            Self::LocalIo { .. } | Self::Io(_) => ErrorKind::LocalIo,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Serializable error classification stored in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connection,
    Authentication,
    RemoteIo,
    TransferVerification,
    CommandExecution,
    Timeout,
    UnknownPreset,
    SessionClosed,
    ConfigValidation,
    LocalIo,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Authentication => "authentication",
            Self::RemoteIo => "remote_io",
            Self::TransferVerification => "transfer_verification",
            Self::CommandExecution => "command_execution",
            Self::Timeout => "timeout",
            Self::UnknownPreset => "unknown_preset",
            Self::SessionClosed => "session_closed",
            Self::ConfigValidation => "config_validation",
            Self::LocalIo => "local_io",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
