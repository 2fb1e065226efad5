//! File System Implementations
//!
//! Concrete implementations of the FileSystem port.

mod local;

pub(crate) use local::atomic_write;
pub use local::LocalFs;
