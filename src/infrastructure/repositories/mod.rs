//! Repository Implementations
//!
//! Concrete implementations of repository ports.

mod report;

pub use report::JsonReportRepository;
