//! Convoy - deployment presets fanned out over ssh
//!
//! Convoy resolves a layered project configuration, expands a named preset
//! into an ordered list of steps (commands and file transfers), and runs
//! those steps against many hosts at once. Each target gets its own session
//! and stops at its first failure; the run ends with a per-target report.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::{
    prepare_deployment, DeployOptions, DeployUseCase, FanOutExecutor, PreparedDeployment,
    RemoteSession,
};
pub use config::{resolve, ConfigValue, ResolvedConfig};
pub use domain::entities::{summarize, DeploymentPlan, DeploymentReport, Step, TargetOutcome};
pub use domain::services::{expand_preset, list_presets};
pub use domain::value_objects::Target;
pub use error::{ConvoyError, ConvoyResult, ErrorKind};
