//! CLI Argument Parsing
//!
//! This module defines the CLI interface using clap.
//!
//! ## Design Notes
//!
//! - Global flags (--json, --color, --verbose) are inherited by all subcommands
//! - `--config` is per subcommand; without it the project config is discovered

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// Convoy - run deployment presets against many hosts over ssh
#[derive(Parser, Debug)]
#[command(name = "convoy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for CI
    #[arg(long, global = true)]
    pub json: bool,

    /// Color output mode
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorWhen>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the active preset against every target
    Deploy {
        /// Config file (default: convoy.toml/.yml/.yaml/.json in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preset to run instead of deployment.preset
        #[arg(long)]
        preset: Option<String>,

        /// Target as [user@]host[:port]; repeatable, replaces configured targets
        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Maximum number of targets deployed at once
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        concurrency: Option<u64>,

        /// Write the deployment report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show the rendered steps and targets without connecting
    Plan {
        /// Config file (default: convoy.toml/.yml/.yaml/.json in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preset to plan instead of deployment.preset
        #[arg(long)]
        preset: Option<String>,

        /// Target as [user@]host[:port]; repeatable, replaces configured targets
        #[arg(short, long = "target")]
        targets: Vec<String>,
    },

    /// Print the resolved configuration
    Config {
        /// Config file (default: convoy.toml/.yml/.yaml/.json in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the built-in presets
    Presets,
}
