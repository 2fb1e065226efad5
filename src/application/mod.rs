//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Components
//!
//! - `RemoteSession` - One target's connection and its file/command operations
//! - `FanOutExecutor` - Bounded worker pool running a plan on many targets
//! - `DeployUseCase` - Prepare, fan out, report

pub mod deploy;
pub mod executor;
pub mod session;

pub use deploy::{prepare_deployment, DeployOptions, DeployUseCase, PreparedDeployment};
pub use executor::{ExecutorOptions, FanOutExecutor};
pub use session::{CommandOutput, RemoteSession, SessionOptions, SessionState};
