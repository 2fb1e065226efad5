//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `fs/` - Local file system
//! - `transport/` - Remote transports (ssh, local shell, in-memory)
//! - `events/` - Deploy event sinks (console, JSON)
//! - `repositories/` - Report persistence

pub mod events;
pub mod fs;
pub mod repositories;
pub mod transport;

// Re-export for convenience
pub use events::{ConsoleEventSink, JsonEventSink};
pub use fs::LocalFs;
pub use repositories::JsonReportRepository;
pub use transport::{LocalTransport, MemoryTransport, SshTransport};
