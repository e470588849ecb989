//! Manifest emission.
//!
//! [`ManifestWriter`] walks the graph in registration order and asks each
//! resource's publishing callback to fill a [`ManifestContext`]. Records are
//! collected into a [`Manifest`] only when every resource succeeded, so a
//! failed publish never yields a partial document.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use topos_common::config::PublishConfig;
use topos_common::constants::{CONTAINER_V0, PROJECT_V0};
use topos_common::error::{Result, ToposError};
use topos_common::types::RelationRole;

use crate::graph::GraphState;
use crate::resource::{Resource, ResourceKind, ResourceLookup};

const TYPE_FIELD: &str = "type";

/// The emitted manifest document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    /// One record per resource, keyed by name, in registration order.
    pub resources: IndexMap<String, Value>,
}

impl Manifest {
    /// Renders the manifest as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Returns the record of one resource.
    pub fn record(&self, name: &str) -> Option<&Value> {
        self.resources.get(name)
    }
}

/// Write context handed to a publishing callback.
///
/// Accumulates the record of a single resource and exposes read access to
/// the rest of the graph for resolving relations.
#[derive(Debug)]
pub struct ManifestContext<'a> {
    graph: &'a GraphState,
    resource: &'a Resource,
    record: Map<String, Value>,
}

impl<'a> ManifestContext<'a> {
    fn new(graph: &'a GraphState, resource: &'a Resource) -> Self {
        Self {
            graph,
            resource,
            record: Map::new(),
        }
    }

    /// Returns the resource being published.
    pub const fn resource(&self) -> &'a Resource {
        self.resource
    }

    /// Returns the publish configuration.
    pub const fn config(&self) -> &'a PublishConfig {
        self.graph.config()
    }

    /// Writes the schema tag. Must be the first field of the record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if any field was already written.
    pub fn write_type(&mut self, schema: &str) -> Result<()> {
        if !self.record.is_empty() {
            return Err(self.invalid("`type` must be the first and only schema field"));
        }
        let _ = self
            .record
            .insert(TYPE_FIELD.to_string(), Value::from(schema));
        Ok(())
    }

    /// Writes a kind-specific field after the schema tag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if no `type` was written yet or `key` is `type`.
    pub fn write_field(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        if key == TYPE_FIELD {
            return Err(self.invalid("`type` can only be written with write_type"));
        }
        if !self.record.contains_key(TYPE_FIELD) {
            return Err(self.invalid(&format!("field `{key}` written before `type`")));
        }
        let _ = self.record.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Writes the effective environment as an `env` mapping, resolving each
    /// lazy value. Nothing is written when the environment is empty.
    ///
    /// # Errors
    ///
    /// See [`ManifestContext::write_field`].
    pub fn write_env(&mut self) -> Result<()> {
        let env: Map<String, Value> = self
            .resource
            .environment()
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::from(value.get())))
            .collect();
        if env.is_empty() {
            return Ok(());
        }
        self.write_field("env", Value::Object(env))
    }

    /// Writes the service bindings as a `bindings` mapping. Nothing is
    /// written when the resource has no bindings.
    ///
    /// # Errors
    ///
    /// See [`ManifestContext::write_field`].
    pub fn write_bindings(&mut self) -> Result<()> {
        let mut bindings = Map::new();
        for binding in self.resource.bindings() {
            let mut entry = Map::new();
            let _ = entry.insert("scheme".into(), Value::from(binding.scheme.as_str()));
            let _ = entry.insert("protocol".into(), Value::from(binding.protocol.as_str()));
            let _ = entry.insert("transport".into(), Value::from(binding.transport.as_str()));
            if let Some(port) = binding.container_port {
                let _ = entry.insert("containerPort".into(), Value::from(port));
            }
            let _ = bindings.insert(binding.name.clone(), Value::Object(entry));
        }
        if bindings.is_empty() {
            return Ok(());
        }
        self.write_field("bindings", Value::Object(bindings))
    }

    /// Resolves a referenced resource by name.
    ///
    /// # Errors
    ///
    /// Returns `DanglingRelation` if the name is not registered.
    pub fn resolve(&self, name: &str, role: RelationRole) -> Result<&'a Resource> {
        self.graph
            .lookup(name)
            .ok_or_else(|| ToposError::DanglingRelation {
                resource: self.resource.name().to_string(),
                target: name.to_string(),
                role,
            })
    }

    /// Resolves the targets of this resource's relations with `role`,
    /// returning their names in relation order.
    ///
    /// # Errors
    ///
    /// Returns `DanglingRelation` for the first unresolved target.
    pub fn related_names(&self, role: RelationRole) -> Result<Vec<String>> {
        self.resource
            .related(role)
            .into_iter()
            .map(|target| self.resolve(target, role).map(|r| r.name().to_string()))
            .collect()
    }

    /// Computes the connection string of the resource being published.
    ///
    /// # Errors
    ///
    /// See [`Resource::connection_string`].
    pub fn connection_string(&self) -> Result<String> {
        self.resource.connection_string(self.graph)
    }

    /// Computes the connection string of another resource.
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` for unknown names, otherwise see
    /// [`Resource::connection_string`].
    pub fn connection_string_of(&self, name: &str) -> Result<String> {
        self.graph
            .lookup(name)
            .ok_or_else(|| ToposError::UnknownResource {
                name: name.to_string(),
            })?
            .connection_string(self.graph)
    }

    fn finish(self) -> Result<Value> {
        if !self.record.contains_key(TYPE_FIELD) {
            return Err(self.invalid("record has no `type` field"));
        }
        Ok(Value::Object(self.record))
    }

    fn invalid(&self, message: &str) -> ToposError {
        ToposError::InvalidRecord {
            resource: self.resource.name().to_string(),
            message: message.to_string(),
        }
    }
}

/// Walks a graph and assembles its manifest.
#[derive(Debug)]
pub struct ManifestWriter<'a> {
    graph: &'a GraphState,
}

impl<'a> ManifestWriter<'a> {
    pub(crate) const fn new(graph: &'a GraphState) -> Self {
        Self { graph }
    }

    /// Produces the manifest.
    ///
    /// # Errors
    ///
    /// Fails on the first dangling relation, missing callback, invalid
    /// record, or callback error, discarding everything emitted so far.
    pub fn write(self) -> Result<Manifest> {
        tracing::info!("publishing manifest");
        self.check_relations()?;

        let mut resources = IndexMap::new();
        for resource in self.graph.resources() {
            let callback = resource.publishing_callback().ok_or_else(|| {
                ToposError::UnpublishableResource {
                    name: resource.name().to_string(),
                }
            })?;
            let mut context = ManifestContext::new(self.graph, resource);
            callback.invoke(&mut context)?;
            let record = context.finish()?;
            tracing::debug!(resource = %resource.name(), "record emitted");
            let _ = resources.insert(resource.name().to_string(), record);
        }

        tracing::info!(count = resources.len(), "manifest published");
        Ok(Manifest { resources })
    }

    fn check_relations(&self) -> Result<()> {
        for resource in self.graph.resources() {
            for relation in resource.relations() {
                if self.graph.lookup(&relation.target).is_none() {
                    tracing::warn!(
                        resource = %resource.name(),
                        target = %relation.target,
                        role = %relation.role,
                        "dangling relation"
                    );
                    return Err(ToposError::DanglingRelation {
                        resource: resource.name().to_string(),
                        target: relation.target.clone(),
                        role: relation.role,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Publishes a generic container as `container.v0`.
///
/// # Errors
///
/// Returns `MissingConfiguration` if the container has no image.
pub fn write_container(context: &mut ManifestContext<'_>) -> Result<()> {
    let image = context
        .resource()
        .image()
        .ok_or_else(|| ToposError::MissingConfiguration {
            resource: context.resource().name().to_string(),
            what: "container image".into(),
        })?;
    context.write_type(CONTAINER_V0)?;
    context.write_field("image", image.reference())?;
    context.write_env()?;
    context.write_bindings()
}

/// Publishes a project as `project.v0`.
///
/// # Errors
///
/// Returns `MissingConfiguration` if the resource is not a project.
pub fn write_project(context: &mut ManifestContext<'_>) -> Result<()> {
    let ResourceKind::Project { path } = context.resource().kind() else {
        return Err(ToposError::MissingConfiguration {
            resource: context.resource().name().to_string(),
            what: "project path".into(),
        });
    };
    context.write_type(PROJECT_V0)?;
    context.write_field("path", path.as_str())?;
    context.write_env()?;
    context.write_bindings()
}
