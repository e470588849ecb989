//! Publishing a Dapr-enabled application via the Topos SDK.
//!
//! Demonstrates registering components, a project with two bindings, and a
//! sidecar that loads the components, then printing the manifest.
//!
//! Run with:
//! ```bash
//! cargo run -p topos-sdk --example dapr_manifest
//! ```

#![allow(clippy::print_stdout)]

use topos_common::error::ToposError;
use topos_compose::annotation::ServiceBinding;
use topos_compose::graph::ApplicationGraph;
use topos_sdk::prelude::*;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let graph = ApplicationGraph::new();
    let _ = graph.add_dapr_state_store("statestore")?;
    let _ = graph.add_dapr_pub_sub("pubsub")?;

    let servicea = graph
        .add_project("servicea", "../ServiceA/ServiceA.csproj")?
        .with_service_binding(ServiceBinding::http("http"))
        .with_service_binding(ServiceBinding::https("https"));
    let _ = servicea.with_dapr_sidecar(
        "service-a",
        DaprSidecarOptions {
            app_id: None,
            components: vec!["statestore".into(), "pubsub".into()],
        },
    )?;

    let manifest = graph.publish()?;
    println!("{}", manifest.to_json_string(true)?);

    match graph.add_dapr_state_store("late") {
        Ok(_) => tracing::warn!("expected the published graph to reject registration"),
        Err(ToposError::GraphSealed { name }) => {
            tracing::info!(%name, "registration after publish correctly rejected");
        }
        Err(e) => tracing::error!(%e, "unexpected error"),
    }

    Ok(())
}
