//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod deploy_events;
pub mod file_system;
pub mod report_repository;
pub mod transport;

pub use deploy_events::{DeployEvent, DeployEventSink, NoopEventSink};
pub use file_system::{FileSystem, FsError, FsResult};
pub use report_repository::{ReportError, ReportRepository, ReportResult};
pub use transport::{Connection, ExecOutput, Transport, TransportError, TransportResult};
