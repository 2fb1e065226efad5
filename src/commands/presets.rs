use anyhow::Result;

use convoy::list_presets;
use convoy::presentation::output::render_presets;

use super::emit;

pub fn cmd_presets(json: bool) -> Result<()> {
    let presets = list_presets();
    if json {
        let data: Vec<_> = presets
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "description": p.description,
                    "steps": p.steps,
                })
            })
            .collect();
        emit(serde_json::json!({
            "event": "presets",
            "command": "presets",
            "presets": data,
        }))?;
    } else {
        print!("{}", render_presets(presets));
    }
    Ok(())
}
