use std::path::Path;

use anyhow::{Context, Result};

use convoy::config::resolve;

use super::{emit, load_project};

/// Print the resolved configuration: defaults, files and environment merged
pub fn cmd_config(config: Option<&Path>, json: bool) -> Result<()> {
    let (loaded, _) = load_project(config)?;
    let resolved = resolve(&loaded.raw)?;

    if json {
        emit(serde_json::json!({
            "event": "config",
            "command": "config",
            "sources": loaded.sources.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            "config": resolved.as_value(),
        }))?;
        return Ok(());
    }

    if loaded.sources.is_empty() {
        println!("# sources: (defaults only)");
    } else {
        for source in &loaded.sources {
            println!("# source: {}", source.display());
        }
    }
    let text =
        toml::to_string(resolved.as_value()).context("cannot render configuration as TOML")?;
    print!("{}", text);
    Ok(())
}
