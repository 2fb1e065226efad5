//! Transport Implementations
//!
//! Concrete implementations of the Transport port:
//! - `SshTransport` - system `ssh` client
//! - `LocalTransport` - local shell rooted in a directory
//! - `MemoryTransport` - in-memory hosts with fault injection

mod local;
mod memory;
mod process;
mod ssh;

pub use local::LocalTransport;
pub use memory::MemoryTransport;
pub use ssh::{shell_quote, SshTransport};
