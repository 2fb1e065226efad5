//! Deployment preparation
//!
//! Everything that can fail before a target is contacted: preset lookup,
//! config resolution, placeholder rendering and target selection. Errors
//! here are fatal to the whole deployment.

use crate::config::{get_deployment_preset, resolve, ConfigValue, ResolvedConfig};
use crate::domain::entities::DeploymentPlan;
use crate::domain::services::{expand_preset, render_steps};
use crate::domain::value_objects::{validate_targets, Target};
use crate::error::ConvoyResult;

use super::options::DeployOptions;

/// A validated config, its rendered plan and the targets to run it on
#[derive(Debug, Clone)]
pub struct PreparedDeployment {
    pub config: ResolvedConfig,
    pub plan: DeploymentPlan,
    pub targets: Vec<Target>,
}

/// Resolve `raw` with `options` on top and build the plan.
///
/// The preset is looked up on the raw input first, so an unknown preset is
/// reported even when other keys are malformed.
pub fn prepare_deployment(
    raw: &ConfigValue,
    options: &DeployOptions,
) -> ConvoyResult<PreparedDeployment> {
    let raw = options.apply_to(raw);

    let preset = get_deployment_preset(&raw);
    let templates = expand_preset(&preset)?;

    let config = resolve(&raw)?;
    let steps = render_steps(&templates, config.as_value())?
        .iter()
        .map(|step| step.with_local_base(&options.project_dir))
        .collect();

    let targets = if options.targets.is_empty() {
        config.targets()?
    } else {
        let defaults = config.target_defaults();
        options
            .targets
            .iter()
            .map(|spec| Target::parse(spec, &defaults))
            .collect::<ConvoyResult<Vec<_>>>()?
    };
    validate_targets(&targets)?;

    Ok(PreparedDeployment {
        config,
        plan: DeploymentPlan::new(preset, steps),
        targets,
    })
}
