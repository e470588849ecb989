//! YAML topology files and their translation into an application graph.
//!
//! A topology file lists resources in the order they are registered:
//!
//! ```yaml
//! publish:
//!   host: localhost
//! resources:
//!   - name: mysql
//!     kind: mysql
//!     port: 13306
//!   - name: catalog
//!     kind: mysql-database
//!     server: mysql
//!   - name: servicea
//!     kind: project
//!     path: ../ServiceA/ServiceA.csproj
//!     bindings:
//!       - { name: http, scheme: http }
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use topos_common::config::PublishConfig;
use topos_common::error::{Result, ToposError};
use topos_common::types::Protocol;
use topos_compose::annotation::{ContainerImage, ServiceBinding};
use topos_compose::builder::ResourceBuilder;
use topos_compose::graph::ApplicationGraph;
use topos_sdk::prelude::*;

/// Root of a topology file.
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    /// Publish settings.
    #[serde(default)]
    pub publish: PublishConfig,
    /// Resources in registration order.
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
}

/// A service binding as written in a topology file.
#[derive(Debug, Clone, Deserialize)]
pub struct BindingSpec {
    /// Binding name.
    pub name: String,
    /// URI scheme.
    pub scheme: String,
    /// Network protocol.
    #[serde(default)]
    pub protocol: Protocol,
    /// Transport; defaults to the scheme.
    pub transport: Option<String>,
    /// Host port.
    pub port: Option<u16>,
    /// Container port.
    pub container_port: Option<u16>,
}

impl BindingSpec {
    fn to_binding(&self) -> ServiceBinding {
        let mut binding = ServiceBinding::new(&self.name, &self.scheme).with_protocol(self.protocol);
        if let Some(transport) = &self.transport {
            binding = binding.with_transport(transport);
        }
        binding.port = self.port;
        binding.container_port = self.container_port;
        binding
    }
}

/// One resource entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResourceSpec {
    /// A MySQL server container.
    Mysql {
        /// Resource name.
        name: String,
        /// Host port.
        port: Option<u16>,
        /// Root password; generated when absent.
        password: Option<String>,
    },
    /// An external MySQL server.
    MysqlConnection {
        /// Resource name.
        name: String,
        /// Literal connection string.
        connection_string: Option<String>,
    },
    /// A database on a previously declared MySQL server or connection.
    MysqlDatabase {
        /// Resource name.
        name: String,
        /// Name of the server resource.
        server: String,
    },
    /// A generic container.
    Container {
        /// Resource name.
        name: String,
        /// Image name.
        image: String,
        /// Image tag.
        #[serde(default = "default_tag")]
        tag: String,
        /// Environment variables.
        #[serde(default)]
        env: IndexMap<String, String>,
        /// Service bindings.
        #[serde(default)]
        bindings: Vec<BindingSpec>,
    },
    /// An application project.
    Project {
        /// Resource name.
        name: String,
        /// Path to the project file.
        path: String,
        /// Environment variables.
        #[serde(default)]
        env: IndexMap<String, String>,
        /// Service bindings.
        #[serde(default)]
        bindings: Vec<BindingSpec>,
    },
    /// A Dapr component.
    DaprComponent {
        /// Resource name.
        name: String,
        /// Component type, e.g. `state` or `pubsub`.
        component_type: String,
    },
    /// A Dapr sidecar attached to a previously declared resource.
    DaprSidecar {
        /// Resource name.
        name: String,
        /// Name of the application resource.
        application: String,
        /// Application id; defaults to the sidecar name.
        app_id: Option<String>,
        /// Component names.
        #[serde(default)]
        components: Vec<String>,
    },
}

fn default_tag() -> String {
    "latest".to_string()
}

/// Reads and parses a topology file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read and `Config` if it is not a valid
/// topology.
pub fn load(path: &Path) -> Result<Topology> {
    tracing::info!(path = %path.display(), "loading topology file");
    let content = std::fs::read_to_string(path).map_err(|e| ToposError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse(&content)
}

/// Parses topology YAML.
///
/// # Errors
///
/// Returns `Config` if the document is not a valid topology.
pub fn parse(content: &str) -> Result<Topology> {
    serde_yaml::from_str(content).map_err(|e| ToposError::Config {
        message: format!("invalid topology: {e}"),
    })
}

/// Registers every resource of the topology in a fresh graph.
///
/// # Errors
///
/// Returns the first registration error, e.g. a duplicate name or a
/// database whose server was not declared before it.
pub fn build_graph(topology: &Topology) -> Result<ApplicationGraph> {
    let graph = ApplicationGraph::new().with_config(topology.publish.clone())?;
    for spec in &topology.resources {
        let _ = register(&graph, spec)?;
    }
    tracing::info!(count = graph.len(), "topology registered");
    Ok(graph)
}

fn register(graph: &ApplicationGraph, spec: &ResourceSpec) -> Result<ResourceBuilder> {
    match spec {
        ResourceSpec::Mysql {
            name,
            port,
            password,
        } => graph.add_mysql_container(name, *port, password.clone()),
        ResourceSpec::MysqlConnection {
            name,
            connection_string,
        } => graph.add_mysql_connection(name, connection_string.clone()),
        ResourceSpec::MysqlDatabase { name, server } => {
            graph.builder_for(server)?.add_database(name)
        }
        ResourceSpec::Container {
            name,
            image,
            tag,
            env,
            bindings,
        } => {
            let builder = graph.add_container(name.as_str(), ContainerImage::new(image, tag), None)?;
            Ok(configure(builder, env, bindings))
        }
        ResourceSpec::Project {
            name,
            path,
            env,
            bindings,
        } => {
            let builder = graph.add_project(name.as_str(), path.as_str())?;
            Ok(configure(builder, env, bindings))
        }
        ResourceSpec::DaprComponent {
            name,
            component_type,
        } => graph.add_dapr_component(name, component_type),
        ResourceSpec::DaprSidecar {
            name,
            application,
            app_id,
            components,
        } => graph.builder_for(application)?.with_dapr_sidecar(
            name,
            DaprSidecarOptions {
                app_id: app_id.clone(),
                components: components.clone(),
            },
        ),
    }
}

fn configure(
    mut builder: ResourceBuilder,
    env: &IndexMap<String, String>,
    bindings: &[BindingSpec],
) -> ResourceBuilder {
    for binding in bindings {
        builder = builder.with_service_binding(binding.to_binding());
    }
    for (key, value) in env {
        builder = builder.with_environment(key, value);
    }
    builder
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    const DAPR: &str = r"
resources:
  - name: statestore
    kind: dapr-component
    component_type: state
  - name: pubsub
    kind: dapr-component
    component_type: pubsub
  - name: servicea
    kind: project
    path: ../ServiceA/ServiceA.csproj
    bindings:
      - { name: http, scheme: http }
      - { name: https, scheme: https, transport: http }
  - name: service-a
    kind: dapr-sidecar
    application: servicea
    components: [statestore, pubsub]
";

    #[test]
    fn parses_and_publishes_dapr_topology() {
        let topology = parse(DAPR).expect("parse");
        assert_eq!(topology.resources.len(), 4);
        assert!(topology.publish.pretty);

        let manifest = build_graph(&topology)
            .expect("graph")
            .publish()
            .expect("publish");
        let keys: Vec<&str> = manifest.resources.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["statestore", "pubsub", "servicea", "service-a"]);
        assert_eq!(
            manifest.record("servicea").expect("servicea")["bindings"]["https"],
            json!({ "scheme": "https", "protocol": "tcp", "transport": "http" })
        );
    }

    #[test]
    fn mysql_database_uses_configured_host() {
        let topology = parse(
            r"
publish:
  host: db.internal
resources:
  - { name: mysql, kind: mysql, port: 3306, password: pw }
  - { name: catalog, kind: mysql-database, server: mysql }
",
        )
        .expect("parse");
        let graph = build_graph(&topology).expect("graph");
        assert_eq!(
            graph.connection_string("catalog").expect("cs"),
            "Server=db.internal;Port=3306;User ID=root;Password=pw;Database=catalog;"
        );
    }

    #[test]
    fn database_before_server_fails() {
        let topology = parse(
            r"
resources:
  - { name: catalog, kind: mysql-database, server: mysql }
  - { name: mysql, kind: mysql }
",
        )
        .expect("parse");
        let err = build_graph(&topology).unwrap_err();
        assert!(matches!(err, ToposError::UnknownResource { .. }));
    }

    #[test]
    fn duplicate_names_fail() {
        let topology = parse(
            r"
resources:
  - { name: api, kind: project, path: a.csproj }
  - { name: api, kind: project, path: b.csproj }
",
        )
        .expect("parse");
        let err = build_graph(&topology).unwrap_err();
        assert!(matches!(err, ToposError::DuplicateResourceName { .. }));
    }

    #[test]
    fn container_env_keeps_file_order() {
        let topology = parse(
            r"
resources:
  - name: cache
    kind: container
    image: redis
    env:
      ZED: '1'
      ALPHA: '2'
    bindings:
      - { name: tcp, scheme: tcp, container_port: 6379 }
",
        )
        .expect("parse");
        let manifest = build_graph(&topology)
            .expect("graph")
            .publish()
            .expect("publish");
        let record = manifest.record("cache").expect("cache");
        assert_eq!(record["image"], "redis:latest");
        let env: Vec<&String> = record["env"].as_object().expect("env").keys().collect();
        assert_eq!(env, vec!["ZED", "ALPHA"]);
    }

    #[test]
    fn unknown_kind_is_a_config_error() {
        let err = parse("resources:\n  - { name: x, kind: kafka }\n").unwrap_err();
        assert!(matches!(err, ToposError::Config { .. }));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(DAPR.as_bytes()).expect("write");
        let topology = load(file.path()).expect("load");
        assert_eq!(topology.resources.len(), 4);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load(Path::new("/nonexistent/topology.yaml")).unwrap_err();
        assert!(matches!(err, ToposError::Io { .. }));
    }
}
