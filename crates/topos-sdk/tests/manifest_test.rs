//! End-to-end tests for graph construction and manifest emission.
//!
//! These tests exercise the full pipeline across the workspace:
//! 1. Register resources through the typed `add_*` operations
//! 2. Configure them through chained builder calls
//! 3. Publish the graph and inspect the emitted manifest

#![allow(clippy::expect_used, clippy::unwrap_used)]

use serde_json::json;
use topos_common::error::ToposError;
use topos_common::types::RelationRole;
use topos_compose::annotation::ServiceBinding;
use topos_compose::credential::{FixedCredentials, SequentialCredentials};
use topos_compose::graph::ApplicationGraph;
use topos_compose::resource::Resource;
use topos_sdk::prelude::*;

fn dapr_topology() -> ApplicationGraph {
    let graph = ApplicationGraph::with_credentials(FixedCredentials::new("pw"));
    let _ = graph.add_dapr_state_store("statestore").expect("statestore");
    let _ = graph.add_dapr_pub_sub("pubsub").expect("pubsub");
    let servicea = graph
        .add_project("servicea", "../ServiceA/ServiceA.csproj")
        .expect("servicea")
        .with_service_binding(ServiceBinding::http("http"))
        .with_service_binding(ServiceBinding::https("https"));
    let _ = servicea
        .with_dapr_sidecar(
            "service-a",
            DaprSidecarOptions {
                app_id: None,
                components: vec!["statestore".into(), "pubsub".into()],
            },
        )
        .expect("sidecar");
    graph
}

// ── Registration ─────────────────────────────────────────────────────

#[test]
fn duplicate_name_fails_and_distinct_names_both_publish() {
    let graph = ApplicationGraph::new();
    let _ = graph.add_project("api", "api.csproj").expect("first");

    let err = graph.add_project("api", "other.csproj").unwrap_err();
    assert!(matches!(err, ToposError::DuplicateResourceName { .. }));

    let _ = graph.add_project("api2", "other.csproj").expect("second");
    let manifest = graph.publish().expect("publish");
    assert!(manifest.resources.contains_key("api"));
    assert!(manifest.resources.contains_key("api2"));
    assert_eq!(manifest.record("api").unwrap()["path"], "api.csproj");
}

#[test]
fn database_cannot_be_added_to_an_unregistered_server() {
    let graph = ApplicationGraph::new();
    let err = graph.builder_for("mysql").unwrap_err();
    assert!(matches!(err, ToposError::UnknownResource { .. }));
    assert!(graph.is_empty());
}

// ── Ordering & determinism ───────────────────────────────────────────

#[test]
fn manifest_key_order_equals_registration_order() {
    let graph = ApplicationGraph::with_credentials(FixedCredentials::new("pw"));
    let _ = graph.add_project("zeta", "z.csproj").expect("zeta");
    let _ = graph
        .add_mysql_container("alpha", Some(3306), None)
        .expect("alpha");
    let _ = graph.add_dapr_state_store("mid").expect("mid");

    let manifest = graph.publish().expect("publish");
    let keys: Vec<&str> = manifest.resources.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

    let json = manifest.to_json_string(false).expect("json");
    let pos = |needle: &str| json.find(needle).expect(needle);
    assert!(pos("\"zeta\"") < pos("\"alpha\""));
    assert!(pos("\"alpha\"") < pos("\"mid\""));
}

#[test]
fn constant_environment_is_byte_identical_across_runs() {
    let build = || {
        let graph = ApplicationGraph::with_credentials(SequentialCredentials::new("pw-"));
        let _ = graph
            .add_mysql_container("mysql", Some(3306), None)
            .expect("mysql");
        let _ = graph
            .add_project("api", "api.csproj")
            .expect("api")
            .with_environment_fn("MODE", || "production".to_string())
            .with_environment("REGION", "eu");
        graph
            .publish()
            .expect("publish")
            .to_json_string(true)
            .expect("json")
    };
    assert_eq!(build(), build());
}

#[test]
fn republish_is_idempotent() {
    let graph = dapr_topology();
    let first = graph.publish().expect("first");
    let second = graph.publish().expect("second");
    assert_eq!(first, second);
}

// ── Relations ────────────────────────────────────────────────────────

#[test]
fn database_emits_parent_name() {
    let graph = ApplicationGraph::with_credentials(FixedCredentials::new("pw"));
    let server = graph
        .add_mysql_container("mysql", Some(3306), None)
        .expect("mysql");
    let _ = server.add_database("catalog").expect("catalog");

    let manifest = graph.publish().expect("publish");
    assert_eq!(manifest.record("catalog").unwrap()["parent"], "mysql");
}

#[test]
fn database_with_unregistered_parent_fails_publish() {
    let graph = ApplicationGraph::new();
    let _ = graph
        .add_resource(Resource::database("catalog", "mysql"))
        .expect("catalog")
        .with_manifest_publishing_callback(|ctx| ctx.write_type("mysql.database.v0"));

    let err = graph.publish().unwrap_err();
    assert!(matches!(
        err,
        ToposError::DanglingRelation { ref resource, ref target, role: RelationRole::Parent }
            if resource == "catalog" && target == "mysql"
    ));
}

// ── Scenario ─────────────────────────────────────────────────────────

#[test]
fn dapr_scenario_manifest() {
    let manifest = dapr_topology().publish().expect("publish");

    assert_eq!(manifest.resources.len(), 4);
    assert_eq!(
        manifest.record("service-a").unwrap()["dapr"]["components"],
        json!(["statestore", "pubsub"])
    );

    let bindings = manifest.record("servicea").unwrap()["bindings"]
        .as_object()
        .expect("bindings object");
    let keys: Vec<&str> = bindings.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["http", "https"]);
    assert_eq!(
        bindings["http"],
        json!({ "scheme": "http", "protocol": "tcp", "transport": "http" })
    );
    assert_eq!(
        bindings["https"],
        json!({ "scheme": "https", "protocol": "tcp", "transport": "http" })
    );

    assert_eq!(
        serde_json::to_value(&manifest).expect("value"),
        json!({
            "resources": {
                "statestore": { "type": "dapr.component.v0", "daprComponent": { "type": "state" } },
                "pubsub": { "type": "dapr.component.v0", "daprComponent": { "type": "pubsub" } },
                "servicea": {
                    "type": "project.v0",
                    "path": "../ServiceA/ServiceA.csproj",
                    "bindings": {
                        "http": { "scheme": "http", "protocol": "tcp", "transport": "http" },
                        "https": { "scheme": "https", "protocol": "tcp", "transport": "http" }
                    }
                },
                "service-a": {
                    "type": "dapr.v0",
                    "dapr": {
                        "application": "servicea",
                        "appId": "service-a",
                        "components": ["statestore", "pubsub"]
                    }
                }
            }
        })
    );
}

#[test]
fn mysql_stack_manifest() {
    let graph = ApplicationGraph::with_credentials(FixedCredentials::new("pw"));
    let server = graph
        .add_mysql_container("mysql", Some(13306), None)
        .expect("mysql");
    let catalog = server.add_database("catalog").expect("catalog");
    let cs = catalog.connection_string().expect("cs");
    let _ = graph
        .add_project("api", "../Api/Api.csproj")
        .expect("api")
        .with_environment("ConnectionStrings__catalog", cs);

    let manifest = graph.publish().expect("publish");
    assert_eq!(
        manifest.record("api").unwrap()["env"]["ConnectionStrings__catalog"],
        "Server=localhost;Port=13306;User ID=root;Password=pw;Database=catalog;"
    );
    assert_eq!(
        manifest.record("mysql").unwrap()["env"]["MYSQL_ROOT_PASSWORD"],
        "pw"
    );
}

// ── Accessors ────────────────────────────────────────────────────────

#[test]
fn connection_string_accessor_is_idempotent() {
    let graph = ApplicationGraph::new();
    let server = graph
        .add_mysql_container("mysql", Some(3306), None)
        .expect("mysql");
    let db = server.add_database("catalog").expect("catalog");
    assert_eq!(
        db.connection_string().expect("first"),
        db.connection_string().expect("second")
    );
    assert_eq!(
        server.connection_string().expect("first"),
        server.connection_string().expect("second")
    );
}

#[test]
fn publish_seals_registration() {
    let graph = dapr_topology();
    let _ = graph.publish().expect("publish");
    let err = graph.add_dapr_state_store("late").unwrap_err();
    assert!(matches!(err, ToposError::GraphSealed { .. }));
}
