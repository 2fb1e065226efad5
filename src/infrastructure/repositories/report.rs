//! JSON Report Repository
//!
//! Implements the ReportRepository port with pretty-printed JSON.

use std::path::Path;

use crate::domain::entities::DeploymentReport;
use crate::domain::ports::file_system::{FileSystem, FsError};
use crate::domain::ports::report_repository::{ReportError, ReportRepository, ReportResult};
use crate::infrastructure::fs::LocalFs;

/// Stores reports as JSON documents
pub struct JsonReportRepository {
    fs: LocalFs,
}

impl JsonReportRepository {
    pub fn new() -> Self {
        Self { fs: LocalFs::new() }
    }
}

impl Default for JsonReportRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn io_error(err: FsError) -> ReportError {
    match err {
        FsError::Io(_, source) => ReportError::Io(source),
        other => ReportError::Io(std::io::Error::other(other.to_string())),
    }
}

impl ReportRepository for JsonReportRepository {
    fn save(&self, report: &DeploymentReport, path: &Path) -> ReportResult<()> {
        let mut json = serde_json::to_string_pretty(report)
            .map_err(|e| ReportError::InvalidFormat(e.to_string()))?;
        json.push('\n');
        self.fs.write(path, json.as_bytes()).map_err(io_error)
    }

    fn load(&self, path: &Path) -> ReportResult<DeploymentReport> {
        let bytes = self.fs.read(path).map_err(io_error)?;
        serde_json::from_slice(&bytes).map_err(|e| ReportError::InvalidFormat(e.to_string()))
    }
}
