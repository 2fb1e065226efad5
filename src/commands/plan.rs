use std::path::Path;

use anyhow::Result;

use convoy::application::{prepare_deployment, DeployOptions};
use convoy::presentation::output::render_plan;

use super::{emit, load_project};

pub fn cmd_plan(
    config: Option<&Path>,
    preset: Option<String>,
    targets: Vec<String>,
    json: bool,
) -> Result<()> {
    let (loaded, project_dir) = load_project(config)?;

    let mut options = DeployOptions::new(&project_dir).with_targets(targets);
    if let Some(preset) = preset {
        options = options.with_preset(preset);
    }
    let prepared = prepare_deployment(&loaded.raw, &options)?;

    if json {
        emit(serde_json::json!({
            "event": "plan",
            "command": "plan",
            "preset": prepared.plan.preset,
            "steps": prepared.plan.steps,
            "targets": prepared.targets.iter().map(|t| t.id()).collect::<Vec<_>>(),
            "transport": prepared.config.transport().as_str(),
        }))?;
    } else {
        print!("{}", render_plan(&prepared));
    }
    Ok(())
}
