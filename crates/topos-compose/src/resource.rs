//! Resources: the named nodes of the application topology.
//!
//! A resource is a closed set of kinds plus an ordered annotation list.
//! Kind-specific behavior (connection strings, default manifest records)
//! lives in `match` arms over [`ResourceKind`] rather than in a type
//! hierarchy.

use indexmap::IndexMap;
use topos_common::constants::MAX_RELATION_DEPTH;
use topos_common::error::{Result, ToposError};
use topos_common::types::RelationRole;

use crate::annotation::{Annotation, ContainerImage, ManifestCallback, Relation, ServiceBinding};
use crate::value::LazyValue;

/// Name-based access to the other resources of a graph.
pub trait ResourceLookup {
    /// Finds a resource by name.
    fn lookup(&self, name: &str) -> Option<&Resource>;

    /// Host placed into synthesized connection strings.
    fn host(&self) -> &str;
}

/// The variant of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// A container started from an image.
    Container {
        /// Credential generated or supplied at construction.
        credential: String,
    },
    /// An externally managed server reached through a connection string.
    Connection {
        /// Literal connection string, if supplied.
        connection_string: Option<String>,
    },
    /// A database living on a parent server resource.
    Database,
    /// An application project built from source.
    Project {
        /// Path to the project file.
        path: String,
    },
    /// An opaque platform add-on.
    Component {
        /// Platform-specific component type (e.g. `state`).
        component_type: String,
    },
    /// A runtime attached to another resource.
    Sidecar {
        /// Identifier the sidecar registers the application under.
        app_id: Option<String>,
    },
}

impl ResourceKind {
    /// Short name of the kind, for logs and plans.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Container { .. } => "container",
            Self::Connection { .. } => "connection",
            Self::Database => "database",
            Self::Project { .. } => "project",
            Self::Component { .. } => "component",
            Self::Sidecar { .. } => "sidecar",
        }
    }
}

/// A named node in the application graph.
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    kind: ResourceKind,
    annotations: Vec<Annotation>,
}

impl Resource {
    /// Creates a resource with no annotations.
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotations: Vec::new(),
        }
    }

    /// Creates a container resource holding `credential`.
    pub fn container(name: impl Into<String>, credential: impl Into<String>) -> Self {
        Self::new(
            name,
            ResourceKind::Container {
                credential: credential.into(),
            },
        )
    }

    /// Creates a connection resource with an optional literal connection string.
    pub fn connection(name: impl Into<String>, connection_string: Option<String>) -> Self {
        Self::new(name, ResourceKind::Connection { connection_string })
    }

    /// Creates a database resource related to its `parent` server.
    pub fn database(name: impl Into<String>, parent: impl Into<String>) -> Self {
        let mut resource = Self::new(name, ResourceKind::Database);
        resource.add_annotation(Annotation::Relation(Relation::new(
            parent,
            RelationRole::Parent,
        )));
        resource
    }

    /// Creates a project resource.
    pub fn project(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, ResourceKind::Project { path: path.into() })
    }

    /// Creates a component resource.
    pub fn component(name: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self::new(
            name,
            ResourceKind::Component {
                component_type: component_type.into(),
            },
        )
    }

    /// Creates a sidecar resource attached to `application`.
    pub fn sidecar(
        name: impl Into<String>,
        application: impl Into<String>,
        app_id: Option<String>,
    ) -> Self {
        let mut resource = Self::new(name, ResourceKind::Sidecar { app_id });
        resource.add_annotation(Annotation::Relation(Relation::new(
            application,
            RelationRole::Application,
        )));
        resource
    }

    /// Returns the resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resource kind.
    pub const fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Returns all annotations in insertion order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Appends an annotation.
    ///
    /// A container image replaces any earlier image, and a service binding
    /// replaces an earlier binding of the same name in place; everything else
    /// is appended.
    pub fn add_annotation(&mut self, annotation: Annotation) {
        let replaced = match &annotation {
            Annotation::ContainerImage(_) => {
                self.annotations
                    .retain(|a| !matches!(a, Annotation::ContainerImage(_)));
                None
            }
            Annotation::ServiceBinding(binding) => self.annotations.iter().position(
                |a| matches!(a, Annotation::ServiceBinding(b) if b.name == binding.name),
            ),
            _ => None,
        };
        match replaced {
            Some(idx) => self.annotations[idx] = annotation,
            None => self.annotations.push(annotation),
        }
    }

    /// Returns the service bindings in insertion order.
    pub fn bindings(&self) -> impl Iterator<Item = &ServiceBinding> {
        self.annotations.iter().filter_map(|a| match a {
            Annotation::ServiceBinding(b) => Some(b),
            _ => None,
        })
    }

    /// Returns the container image, if any.
    pub fn image(&self) -> Option<&ContainerImage> {
        self.annotations.iter().rev().find_map(|a| match a {
            Annotation::ContainerImage(image) => Some(image),
            _ => None,
        })
    }

    /// Returns the effective environment: one entry per key, in first-seen
    /// order, holding the last value written for that key.
    pub fn environment(&self) -> IndexMap<&str, &LazyValue> {
        let mut env = IndexMap::new();
        for annotation in &self.annotations {
            if let Annotation::Environment(var) = annotation {
                let _ = env.insert(var.key.as_str(), &var.value);
            }
        }
        env
    }

    /// Returns every relation in insertion order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.annotations.iter().filter_map(|a| match a {
            Annotation::Relation(r) => Some(r),
            _ => None,
        })
    }

    /// Returns the targets of relations with the given role, in insertion order.
    pub fn related(&self, role: RelationRole) -> Vec<&str> {
        self.relations()
            .filter(|r| r.role == role)
            .map(|r| r.target.as_str())
            .collect()
    }

    /// Returns the first parent relation target.
    pub fn parent(&self) -> Option<&str> {
        self.related(RelationRole::Parent).into_iter().next()
    }

    /// Returns the active publishing callback (the last one attached).
    pub fn publishing_callback(&self) -> Option<&ManifestCallback> {
        self.annotations.iter().rev().find_map(|a| match a {
            Annotation::ManifestPublishing(cb) => Some(cb),
            _ => None,
        })
    }

    fn external_connection_string(&self) -> Option<&LazyValue> {
        self.annotations.iter().rev().find_map(|a| match a {
            Annotation::ConnectionString(value) => Some(value),
            _ => None,
        })
    }

    /// Computes the connection string clients use to reach this resource.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` when the kind has no connection string
    /// or lacks the data to build one, and `DanglingRelation` when a
    /// database's parent is not registered.
    pub fn connection_string(&self, graph: &impl ResourceLookup) -> Result<String> {
        self.connection_string_at(graph, 0)
    }

    fn connection_string_at(&self, graph: &impl ResourceLookup, depth: usize) -> Result<String> {
        if depth > MAX_RELATION_DEPTH {
            return Err(self.missing("parent chain is too deep or cyclic"));
        }
        match &self.kind {
            ResourceKind::Container { credential } => {
                let port = self
                    .bindings()
                    .find_map(|b| b.port)
                    .ok_or_else(|| self.missing("no service binding with a host port"))?;
                Ok(format!(
                    "Server={};Port={port};User ID=root;Password={credential};",
                    graph.host()
                ))
            }
            ResourceKind::Connection { connection_string } => connection_string
                .clone()
                .or_else(|| self.external_connection_string().map(LazyValue::get))
                .ok_or_else(|| self.missing("no connection string supplied")),
            ResourceKind::Database => {
                let parent_name = self
                    .parent()
                    .ok_or_else(|| self.missing("no parent server"))?;
                let parent =
                    graph
                        .lookup(parent_name)
                        .ok_or_else(|| ToposError::DanglingRelation {
                            resource: self.name.clone(),
                            target: parent_name.to_string(),
                            role: RelationRole::Parent,
                        })?;
                let base = parent.connection_string_at(graph, depth + 1)?;
                Ok(format!("{base}Database={};", self.name))
            }
            ResourceKind::Project { .. }
            | ResourceKind::Component { .. }
            | ResourceKind::Sidecar { .. } => self
                .external_connection_string()
                .map(LazyValue::get)
                .ok_or_else(|| self.missing("connection string")),
        }
    }

    fn missing(&self, what: &str) -> ToposError {
        ToposError::MissingConfiguration {
            resource: self.name.clone(),
            what: what.to_string(),
        }
    }
}
