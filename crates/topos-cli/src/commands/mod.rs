//! CLI command definitions and dispatch.

pub mod plan;
pub mod publish;

use clap::{Parser, Subcommand};

/// Topos — publish application topologies as deployment manifests.
#[derive(Parser, Debug)]
#[command(name = "topos", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the resources of a topology and the order they depend on each other.
    Plan(plan::PlanArgs),
    /// Build the resource graph and write its manifest.
    Publish(publish::PublishArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Plan(args) => plan::execute(&args),
        Command::Publish(args) => publish::execute(&args),
    }
}
