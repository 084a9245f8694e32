//! CLI interface for risk-engine
//!
//! Provides subcommands for:
//! - `run`: Multi-agent paper simulation through the full risk core
//! - `config`: Show effective configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "risk-engine")]
#[command(about = "Risk governance core for a multi-agent automated trading platform")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a multi-agent paper simulation
    Run(RunArgs),
    /// Show effective configuration
    Config,
}
