//! Domain Entities
//!
//! - `Step` - One deployment action in a preset
//! - `DeploymentPlan` - Rendered steps of the active preset
//! - `DeploymentReport` - Per-target outcomes of one deployment

mod plan;
mod report;
mod step;

pub use plan::DeploymentPlan;
pub use report::{
    summarize, DeploymentReport, ErrorRecord, StepResult, StepStatus, Summary, TargetOutcome,
    TargetStatus,
};
pub use step::Step;
