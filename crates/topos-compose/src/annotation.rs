//! Typed metadata attached to resources.
//!
//! Annotations are the only way to extend what a resource does. A resource
//! keeps them in insertion order; when several annotations of the same kind
//! compete, the later one wins during manifest emission.

use std::fmt;
use std::rc::Rc;

use topos_common::error::Result;
use topos_common::types::{Protocol, RelationRole};

use crate::manifest::ManifestContext;
use crate::value::LazyValue;

/// A network endpoint exposed by a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBinding {
    /// Binding name, unique per resource (e.g. `http`).
    pub name: String,
    /// URI scheme clients use to reach the endpoint.
    pub scheme: String,
    /// Network protocol.
    pub protocol: Protocol,
    /// Transport carried over the protocol (e.g. `http`, `http2`).
    pub transport: String,
    /// Port exposed on the host, if fixed at definition time.
    pub port: Option<u16>,
    /// Port the process listens on inside its container.
    pub container_port: Option<u16>,
}

impl ServiceBinding {
    /// Creates a TCP binding whose scheme and transport are both `scheme`.
    pub fn new(name: impl Into<String>, scheme: impl Into<String>) -> Self {
        let scheme = scheme.into();
        Self {
            name: name.into(),
            transport: scheme.clone(),
            scheme,
            protocol: Protocol::Tcp,
            port: None,
            container_port: None,
        }
    }

    /// Creates an `http` binding.
    pub fn http(name: impl Into<String>) -> Self {
        Self::new(name, "http")
    }

    /// Creates an `https` binding carried over `http`.
    pub fn https(name: impl Into<String>) -> Self {
        Self::new(name, "https").with_transport("http")
    }

    /// Sets the protocol.
    #[must_use]
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Sets the transport.
    #[must_use]
    pub fn with_transport(mut self, transport: impl Into<String>) -> Self {
        self.transport = transport.into();
        self
    }

    /// Sets the host port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the container port.
    #[must_use]
    pub const fn with_container_port(mut self, port: u16) -> Self {
        self.container_port = Some(port);
        self
    }
}

/// Image reference of a container resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerImage {
    /// Image name, e.g. `mysql`.
    pub image: String,
    /// Image tag, e.g. `latest`.
    pub tag: String,
}

impl ContainerImage {
    /// Creates an image reference.
    pub fn new(image: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            tag: tag.into(),
        }
    }

    /// Returns the `image:tag` form.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }
}

/// An environment variable whose value is produced at publish time.
#[derive(Debug, Clone)]
pub struct EnvironmentVariable {
    /// Variable name.
    pub key: String,
    /// Deferred value.
    pub value: LazyValue,
}

/// A by-name reference to another resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Name of the referenced resource.
    pub target: String,
    /// What the referenced resource is to this one.
    pub role: RelationRole,
}

impl Relation {
    /// Creates a relation.
    pub fn new(target: impl Into<String>, role: RelationRole) -> Self {
        Self {
            target: target.into(),
            role,
        }
    }
}

type PublishFn = dyn Fn(&mut ManifestContext<'_>) -> Result<()>;

/// Renders one resource into its manifest record.
#[derive(Clone)]
pub struct ManifestCallback(Rc<PublishFn>);

impl ManifestCallback {
    /// Wraps a publishing function.
    pub fn new(callback: impl Fn(&mut ManifestContext<'_>) -> Result<()> + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Invokes the callback.
    ///
    /// # Errors
    ///
    /// Propagates whatever the callback returns.
    pub fn invoke(&self, context: &mut ManifestContext<'_>) -> Result<()> {
        (self.0)(context)
    }
}

impl fmt::Debug for ManifestCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ManifestCallback")
    }
}

/// Metadata attached to a resource.
#[derive(Debug, Clone)]
pub enum Annotation {
    /// Network endpoint.
    ServiceBinding(ServiceBinding),
    /// Container image reference.
    ContainerImage(ContainerImage),
    /// Environment variable.
    Environment(EnvironmentVariable),
    /// By-name reference to another resource.
    Relation(Relation),
    /// Connection string configured from outside the graph.
    ConnectionString(LazyValue),
    /// Manifest publishing callback.
    ManifestPublishing(ManifestCallback),
}

impl Annotation {
    /// Creates an environment variable annotation with a constant value.
    pub fn environment(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Environment(EnvironmentVariable {
            key: key.into(),
            value: LazyValue::constant(value),
        })
    }

    /// Creates an environment variable annotation evaluated at publish time.
    pub fn environment_fn(key: impl Into<String>, value: impl Fn() -> String + 'static) -> Self {
        Self::Environment(EnvironmentVariable {
            key: key.into(),
            value: LazyValue::new(value),
        })
    }

    /// Creates a publishing callback annotation.
    pub fn publishing(
        callback: impl Fn(&mut ManifestContext<'_>) -> Result<()> + 'static,
    ) -> Self {
        Self::ManifestPublishing(ManifestCallback::new(callback))
    }

    /// Short name of the annotation kind, for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ServiceBinding(_) => "service-binding",
            Self::ContainerImage(_) => "container-image",
            Self::Environment(_) => "environment",
            Self::Relation(_) => "relation",
            Self::ConnectionString(_) => "connection-string",
            Self::ManifestPublishing(_) => "manifest-publishing",
        }
    }
}
