//! Convoy CLI - run deployment presets against many hosts
//!
//! Usage: convoy <COMMAND>
//!
//! Commands:
//!   deploy   Run the active preset against every target
//!   plan     Show the rendered steps and targets
//!   config   Print the resolved configuration
//!   presets  List the built-in presets

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use convoy::presentation::{Cli, Commands};

mod commands;

use commands::{cmd_config, cmd_deploy, cmd_plan, cmd_presets, DeployArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            commands::print_error(&err, json);
            ExitCode::from(2)
        }
    }
}

/// Dispatch a subcommand; `Ok(false)` means it ran but did not succeed
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Deploy {
            config,
            preset,
            targets,
            concurrency,
            report,
        } => cmd_deploy(
            DeployArgs {
                config,
                preset,
                targets,
                concurrency: concurrency.map(|c| c as usize),
                report,
            },
            cli.json,
            cli.color,
            cli.verbose,
        ),
        Commands::Plan {
            config,
            preset,
            targets,
        } => cmd_plan(config.as_deref(), preset, targets, cli.json).map(|_| true),
        Commands::Config { config } => cmd_config(config.as_deref(), cli.json).map(|_| true),
        Commands::Presets => cmd_presets(cli.json).map(|_| true),
    }
}
