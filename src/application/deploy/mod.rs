//! Deploy Module
//!
//! Orchestrates the deployment flow for Convoy.
//!
//! ## Structure
//!
//! - `options` - CLI-level overrides (`DeployOptions`)
//! - `prepare` - Config resolution, preset expansion and target selection
//! - `use_case` - Fan-out over the prepared targets (`DeployUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use convoy::application::deploy::{prepare_deployment, DeployOptions, DeployUseCase};
//!
//! let prepared = prepare_deployment(&raw, &DeployOptions::new(project_dir))?;
//! let report = DeployUseCase::new(transport, fs).execute(&prepared);
//! ```

mod options;
mod prepare;
mod use_case;

pub use options::DeployOptions;
pub use prepare::{prepare_deployment, PreparedDeployment};
pub use use_case::DeployUseCase;

#[cfg(test)]
mod tests;
