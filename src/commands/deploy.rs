use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;

use convoy::application::{prepare_deployment, DeployOptions};
use convoy::domain::ports::{DeployEventSink, ReportRepository};
use convoy::infrastructure::{ConsoleEventSink, JsonEventSink, JsonReportRepository};
use convoy::presentation::output::{render_report, use_color};
use convoy::presentation::{create_deploy_use_case, ColorWhen};
use convoy::summarize;

use super::load_project;

#[derive(Debug, Default)]
pub struct DeployArgs {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub targets: Vec<String>,
    pub concurrency: Option<usize>,
    pub report: Option<PathBuf>,
}

/// Returns whether every target succeeded
pub fn cmd_deploy(
    args: DeployArgs,
    json: bool,
    color: Option<ColorWhen>,
    verbose: u8,
) -> Result<bool> {
    let (loaded, project_dir) = load_project(args.config.as_deref())?;

    let mut options = DeployOptions::new(&project_dir).with_targets(args.targets);
    if let Some(preset) = args.preset {
        options = options.with_preset(preset);
    }
    if let Some(concurrency) = args.concurrency {
        options = options.with_concurrency(concurrency);
    }
    let prepared = prepare_deployment(&loaded.raw, &options)?;

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .context("cannot install Ctrl+C handler")?;

    let no_color = std::env::var_os("NO_COLOR").is_some();
    let events: Arc<dyn DeployEventSink> = if json {
        Arc::new(JsonEventSink::stdout())
    } else {
        let color = use_color(color, std::io::stderr().is_terminal(), no_color);
        Arc::new(ConsoleEventSink::stderr(color, verbose))
    };

    let report = create_deploy_use_case(&prepared.config, &project_dir)
        .with_events(events)
        .with_cancellation(running)
        .execute(&prepared);

    if let Some(path) = &args.report {
        JsonReportRepository::new()
            .save(&report, path)
            .with_context(|| format!("cannot write report to {}", path.display()))?;
    }

    if !json {
        let color = use_color(color, std::io::stdout().is_terminal(), no_color);
        print!("{}", render_report(&report, color));
    }

    Ok(summarize(&report))
}
