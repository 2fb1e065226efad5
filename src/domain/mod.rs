//! Domain Layer
//!
//! The core of Convoy: pure deployment logic without I/O dependencies.
//!
//! ## Structure
//!
//! - `entities/` - Steps and deployment reports
//! - `value_objects/` - Immutable value types (Target, Timeouts, ContentHash)
//! - `services/` - Preset registry and placeholder rendering
//! - `ports/` - Interface definitions for infrastructure
//!
//! ## Design Principles
//!
//! 1. **No I/O** - This layer never touches the file system or network directly
//! 2. **Ports & Adapters** - All I/O goes through trait-defined ports

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
