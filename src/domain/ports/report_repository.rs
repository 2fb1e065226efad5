//! ReportRepository port - persistence of deployment reports
//!
//! The on-disk format is the adapter's business; it only has to load back
//! an equal report.

use std::path::Path;

use crate::domain::entities::DeploymentReport;

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Report persistence errors
#[derive(Debug)]
pub enum ReportError {
    /// Stored report could not be parsed
    InvalidFormat(String),
    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::InvalidFormat(msg) => write!(f, "Invalid report format: {}", msg),
            ReportError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for ReportError {}

pub trait ReportRepository {
    fn save(&self, report: &DeploymentReport, path: &Path) -> ReportResult<()>;

    fn load(&self, path: &Path) -> ReportResult<DeploymentReport>;
}
