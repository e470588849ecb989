//! Fluent handles for configuring registered resources.

use topos_common::error::Result;
use topos_common::types::RelationRole;

use crate::annotation::{Annotation, ContainerImage, Relation, ServiceBinding};
use crate::graph::ApplicationGraph;
use crate::manifest::ManifestContext;
use crate::resource::Resource;
use crate::value::LazyValue;

/// Builder for one resource registered in an [`ApplicationGraph`].
///
/// A builder only exists for resources that are already registered: it is
/// handed out by the graph's `add_*` operations and by
/// [`ApplicationGraph::builder_for`]. It stores the resource's name, not the
/// resource, and resolves it through the shared graph on every call.
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    name: String,
    graph: ApplicationGraph,
}

impl ResourceBuilder {
    pub(crate) const fn new(name: String, graph: ApplicationGraph) -> Self {
        Self { name, graph }
    }

    /// Returns the name of the wrapped resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the graph the resource is registered in.
    pub const fn graph(&self) -> &ApplicationGraph {
        &self.graph
    }

    /// Returns a snapshot of the wrapped resource.
    pub fn resource(&self) -> Option<Resource> {
        self.graph.resource(&self.name)
    }

    /// Appends an annotation, failing if the graph no longer accepts edits.
    ///
    /// # Errors
    ///
    /// Returns `GraphSealed` once publishing has started or while the graph
    /// is being published.
    pub fn try_with_annotation(self, annotation: Annotation) -> Result<Self> {
        self.graph.annotate(&self.name, annotation)?;
        Ok(self)
    }

    /// Appends an annotation.
    ///
    /// A rejected edit is reported by the next [`ApplicationGraph::publish`];
    /// use [`ResourceBuilder::try_with_annotation`] to see it immediately.
    #[must_use]
    pub fn with_annotation(self, annotation: Annotation) -> Self {
        if let Err(err) = self.graph.annotate(&self.name, annotation) {
            self.graph.defer(err);
        }
        self
    }

    /// Adds an environment variable with a constant value.
    #[must_use]
    pub fn with_environment(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_annotation(Annotation::environment(key, value))
    }

    /// Adds an environment variable whose value is computed once, at publish time.
    #[must_use]
    pub fn with_environment_fn(
        self,
        key: impl Into<String>,
        value: impl Fn() -> String + 'static,
    ) -> Self {
        self.with_annotation(Annotation::environment_fn(key, value))
    }

    /// Adds a service binding.
    #[must_use]
    pub fn with_service_binding(self, binding: ServiceBinding) -> Self {
        self.with_annotation(Annotation::ServiceBinding(binding))
    }

    /// Sets the container image.
    #[must_use]
    pub fn with_image(self, image: impl Into<String>, tag: impl Into<String>) -> Self {
        self.with_annotation(Annotation::ContainerImage(ContainerImage::new(image, tag)))
    }

    /// Adds a by-name relation to another resource.
    #[must_use]
    pub fn with_relation(self, target: impl Into<String>, role: RelationRole) -> Self {
        self.with_annotation(Annotation::Relation(Relation::new(target, role)))
    }

    /// Supplies a connection string configured outside the graph.
    #[must_use]
    pub fn with_connection_string(self, value: impl Into<LazyValue>) -> Self {
        self.with_annotation(Annotation::ConnectionString(value.into()))
    }

    /// Replaces the manifest publishing callback.
    #[must_use]
    pub fn with_manifest_publishing_callback(
        self,
        callback: impl Fn(&mut ManifestContext<'_>) -> Result<()> + 'static,
    ) -> Self {
        self.with_annotation(Annotation::publishing(callback))
    }

    /// Registers `resource` in the same graph as a child of this resource.
    ///
    /// A parent relation pointing at this resource is added to `resource`
    /// before registration.
    ///
    /// # Errors
    ///
    /// See [`ApplicationGraph::add_resource`].
    pub fn add_dependent(&self, mut resource: Resource) -> Result<Self> {
        resource.add_annotation(Annotation::Relation(Relation::new(
            self.name.clone(),
            RelationRole::Parent,
        )));
        self.graph.add_resource(resource)
    }

    /// Computes the connection string of the wrapped resource.
    ///
    /// # Errors
    ///
    /// See [`ApplicationGraph::connection_string`].
    pub fn connection_string(&self) -> Result<String> {
        self.graph.connection_string(&self.name)
    }
}
