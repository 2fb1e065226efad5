//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod hash;
mod target;
mod timeouts;

pub use hash::ContentHash;
pub use target::{validate_targets, Target, TargetDefaults};
pub use timeouts::Timeouts;
