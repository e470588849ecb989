//! `topos publish` — Write the manifest of a topology.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::topology;

/// Arguments for the `publish` subcommand.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Path to the topology file.
    #[arg(default_value = "topology.yaml")]
    pub file: PathBuf,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit compact JSON.
    #[arg(long)]
    pub compact: bool,

    /// Host placed into synthesized connection strings.
    #[arg(long, env = "TOPOS_HOST")]
    pub host: Option<String>,
}

/// Executes the `publish` command.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded, the graph cannot be built
/// or published, or the output cannot be written.
#[allow(clippy::print_stdout)]
pub fn execute(args: &PublishArgs) -> anyhow::Result<()> {
    let mut topology = topology::load(&args.file)?;
    if let Some(host) = &args.host {
        topology.publish.host.clone_from(host);
    }
    if args.compact {
        topology.publish.pretty = false;
    }

    let graph = topology::build_graph(&topology)?;
    let manifest = graph.publish()?;
    let rendered = manifest.to_json_string(topology.publish.pretty)?;

    if let Some(ref out_path) = args.output {
        std::fs::write(out_path, format!("{rendered}\n"))
            .with_context(|| format!("writing {}", out_path.display()))?;
        tracing::info!(path = %out_path.display(), count = manifest.resources.len(), "manifest written");
    } else {
        println!("{rendered}");
    }

    Ok(())
}
