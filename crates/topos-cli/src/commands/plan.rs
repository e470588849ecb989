//! `topos plan` — Display the resources a topology registers.

use std::path::PathBuf;

use clap::Args;

use crate::topology;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the topology file.
    #[arg(default_value = "topology.yaml")]
    pub file: PathBuf,
}

/// Executes the `plan` command.
///
/// Builds the resource graph and lists resources in registration order with
/// their relations, followed by a dependency-first order when relations
/// allow one.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the graph cannot be built.
#[allow(clippy::print_stdout)]
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let topology = topology::load(&args.file)?;
    let graph = topology::build_graph(&topology)?;

    println!("Resource plan for: {}", args.file.display());
    println!();

    for resource in graph.all_resources() {
        println!("  + {} ({})", resource.name(), resource.kind().label());
        if let Some(image) = resource.image() {
            println!("      image: {}", image.reference());
        }
        for binding in resource.bindings() {
            println!(
                "      binding: {} {}/{}",
                binding.name, binding.scheme, binding.protocol
            );
        }
        for relation in resource.relations() {
            println!("      {} -> {}", relation.role, relation.target);
        }
    }

    println!();
    println!("  {} resource(s) will be published.", graph.len());

    match graph.dependency_order() {
        Ok(order) => {
            println!();
            println!("  Dependency order: {}", order.join(", "));
        }
        Err(e) => tracing::warn!(%e, "no dependency order available"),
    }

    Ok(())
}
