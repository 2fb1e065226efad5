mod config;
mod deploy;
mod plan;
mod presets;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use convoy::config::{load_layered, LoadedConfig};
use convoy::ConvoyError;

pub use config::cmd_config;
pub use deploy::{cmd_deploy, DeployArgs};
pub use plan::cmd_plan;
pub use presets::cmd_presets;

/// Layered raw config plus the directory relative paths resolve against.
///
/// With `--config` the project directory is the file's parent; otherwise
/// it is the working directory, where the project config is discovered.
pub fn load_project(config: Option<&Path>) -> Result<(LoadedConfig, PathBuf)> {
    let cwd = std::env::current_dir()?;
    let project_dir = match config.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
        _ => cwd,
    };
    let loaded = load_layered(config, &project_dir)?;
    Ok((loaded, project_dir))
}

/// Write a single NDJSON event to stdout
pub fn emit(event: serde_json::Value) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", event)
}

pub fn print_error(err: &anyhow::Error, json: bool) {
    let kind = err
        .downcast_ref::<ConvoyError>()
        .map(|e| e.kind().as_str());

    if json {
        let _ = emit(serde_json::json!({
            "event": "error",
            "kind": kind,
            "message": format!("{:#}", err),
        }));
        return;
    }

    eprintln!("[ERROR] {:#}", err);
}
