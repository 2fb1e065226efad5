//! Output Rendering
//!
//! Text rendering for reports, plans and presets. Renderers return strings;
//! the binary decides where they go.

use std::fmt::Write;

use crossterm::style::Stylize;

use super::cli::ColorWhen;
use crate::application::deploy::PreparedDeployment;
use crate::domain::entities::{DeploymentReport, TargetOutcome, TargetStatus};
use crate::domain::services::Preset;

/// Decide on colored output from the flag, the stream and `NO_COLOR`
pub fn use_color(when: Option<ColorWhen>, is_terminal: bool, no_color_env: bool) -> bool {
    match when {
        Some(ColorWhen::Always) => true,
        Some(ColorWhen::Never) => false,
        Some(ColorWhen::Auto) | None => is_terminal && !no_color_env,
    }
}

/// Icons for output rendering
struct Icons {
    check: &'static str,
    cross: &'static str,
    skip: &'static str,
}

const ICONS: Icons = Icons {
    check: "✓",
    cross: "✗",
    skip: "○",
};

/// Final per-target summary of a deployment
pub fn render_report(report: &DeploymentReport, color: bool) -> String {
    let summary = report.summary();
    let mut out = String::new();

    let headline = format!(
        "Deployment '{}': {} of {} target(s) succeeded",
        report.preset, summary.succeeded, summary.total
    );
    let headline = match (color, report.success) {
        (false, _) => headline,
        (true, true) => headline.green().bold().to_string(),
        (true, false) => headline.red().bold().to_string(),
    };
    let _ = writeln!(out, "{}", headline);
    let _ = writeln!(out);

    for (id, outcome) in &report.targets {
        render_outcome(&mut out, id, outcome, color);
    }
    out
}

fn render_outcome(out: &mut String, id: &str, outcome: &TargetOutcome, color: bool) {
    let paint = |text: String, status: TargetStatus| -> String {
        if !color {
            return text;
        }
        match status {
            TargetStatus::Succeeded => text.green().to_string(),
            TargetStatus::Failed => text.red().to_string(),
            TargetStatus::Cancelled => text.yellow().to_string(),
        }
    };

    match outcome.status {
        TargetStatus::Succeeded => {
            let line = format!("{} {}", ICONS.check, id);
            let _ = writeln!(
                out,
                "  {}  {} step(s)",
                paint(line, outcome.status),
                outcome.steps.len()
            );
        }
        TargetStatus::Failed => {
            let line = format!("{} {}", ICONS.cross, id);
            match outcome.failed_step() {
                Some(step) => {
                    let kind = step.error().map(|e| e.kind.as_str()).unwrap_or("unknown");
                    let _ = writeln!(
                        out,
                        "  {}  step {} failed ({})",
                        paint(line, outcome.status),
                        step.index + 1,
                        kind
                    );
                    let _ = writeln!(out, "      {}", step.description());
                    if let Some(error) = step.error() {
                        let _ = writeln!(out, "      {}", error.message);
                    }
                }
                None => {
                    let (kind, message) = outcome
                        .error
                        .as_ref()
                        .map(|e| (e.kind.as_str(), e.message.as_str()))
                        .unwrap_or(("unknown", ""));
                    let _ = writeln!(out, "  {}  {}", paint(line, outcome.status), kind);
                    let _ = writeln!(out, "      {}", message);
                }
            }
        }
        TargetStatus::Cancelled => {
            let line = format!("{} {}", ICONS.skip, id);
            let _ = writeln!(
                out,
                "  {}  cancelled after {} step(s)",
                paint(line, outcome.status),
                outcome.steps.len()
            );
        }
    }
}

/// Steps and targets of a prepared deployment
pub fn render_plan(prepared: &PreparedDeployment) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Preset: {}", prepared.plan.preset);
    let _ = writeln!(out, "Steps:");
    for (i, step) in prepared.plan.steps.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, step);
    }
    let _ = writeln!(out, "Targets:");
    for target in &prepared.targets {
        let _ = writeln!(out, "  - {}", target);
    }
    out
}

/// Built-in presets with their step templates
pub fn render_presets(presets: &[Preset]) -> String {
    let mut out = String::new();
    for (n, preset) in presets.iter().enumerate() {
        if n > 0 {
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "{}: {}", preset.name, preset.description);
        for (i, step) in preset.steps.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, step);
        }
    }
    out
}
