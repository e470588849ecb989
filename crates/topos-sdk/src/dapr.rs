//! Dapr components and sidecars.
//!
//! A sidecar is its own resource. It refers to the application it runs next
//! to and to the components it loads by name only, so components may be
//! registered before or after the sidecar that uses them.

use serde_json::{Map, Value};
use topos_common::constants::{DAPR_COMPONENT_V0, DAPR_PUB_SUB, DAPR_STATE_STORE, DAPR_V0};
use topos_common::error::{Result, ToposError};
use topos_common::types::RelationRole;
use topos_compose::annotation::{Annotation, Relation};
use topos_compose::builder::ResourceBuilder;
use topos_compose::graph::ApplicationGraph;
use topos_compose::manifest::ManifestContext;
use topos_compose::resource::{Resource, ResourceKind};

/// Options for a Dapr sidecar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaprSidecarOptions {
    /// Application id; defaults to the sidecar's resource name.
    pub app_id: Option<String>,
    /// Names of the components loaded by the sidecar, in load order.
    pub components: Vec<String>,
}

/// Dapr operations on the application graph.
pub trait DaprExt {
    /// Adds a Dapr component of the given type.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateResourceName` or `GraphSealed`.
    fn add_dapr_component(&self, name: &str, component_type: &str) -> Result<ResourceBuilder>;

    /// Adds a Dapr state store component.
    ///
    /// # Errors
    ///
    /// See [`DaprExt::add_dapr_component`].
    fn add_dapr_state_store(&self, name: &str) -> Result<ResourceBuilder> {
        self.add_dapr_component(name, DAPR_STATE_STORE)
    }

    /// Adds a Dapr pub/sub component.
    ///
    /// # Errors
    ///
    /// See [`DaprExt::add_dapr_component`].
    fn add_dapr_pub_sub(&self, name: &str) -> Result<ResourceBuilder> {
        self.add_dapr_component(name, DAPR_PUB_SUB)
    }
}

impl DaprExt for ApplicationGraph {
    fn add_dapr_component(&self, name: &str, component_type: &str) -> Result<ResourceBuilder> {
        let mut component = Resource::component(name, component_type);
        component.add_annotation(Annotation::publishing(write_component));
        self.add_resource(component)
    }
}

/// Dapr operations on resource builders.
pub trait DaprBuilderExt: Sized {
    /// Attaches a Dapr sidecar named `name` to this resource and returns the
    /// sidecar's builder.
    ///
    /// # Errors
    ///
    /// Returns `Config` when called on a sidecar or component, otherwise
    /// `DuplicateResourceName` or `GraphSealed`.
    fn with_dapr_sidecar(&self, name: &str, options: DaprSidecarOptions)
    -> Result<ResourceBuilder>;

    /// Makes this sidecar load the named component.
    ///
    /// # Errors
    ///
    /// Returns `Config` when the builder does not wrap a sidecar and
    /// `GraphSealed` once publishing has started.
    fn with_dapr_component(self, component: &str) -> Result<Self>;
}

impl DaprBuilderExt for ResourceBuilder {
    fn with_dapr_sidecar(
        &self,
        name: &str,
        options: DaprSidecarOptions,
    ) -> Result<ResourceBuilder> {
        if let Some(app) = self.resource() {
            if matches!(
                app.kind(),
                ResourceKind::Sidecar { .. } | ResourceKind::Component { .. }
            ) {
                return Err(ToposError::Config {
                    message: format!(
                        "cannot attach sidecar \"{name}\" to {} resource \"{}\"",
                        app.kind().label(),
                        app.name()
                    ),
                });
            }
        }

        let mut sidecar = Resource::sidecar(name, self.name(), options.app_id);
        for component in options.components {
            sidecar.add_annotation(Annotation::Relation(Relation::new(
                component,
                RelationRole::Component,
            )));
        }
        sidecar.add_annotation(Annotation::publishing(write_sidecar));
        tracing::debug!(application = %self.name(), sidecar = name, "attaching dapr sidecar");
        self.graph().add_resource(sidecar)
    }

    fn with_dapr_component(self, component: &str) -> Result<Self> {
        match self.resource() {
            Some(sidecar) if matches!(sidecar.kind(), ResourceKind::Sidecar { .. }) => {}
            Some(other) => {
                return Err(ToposError::Config {
                    message: format!(
                        "cannot load component \"{component}\" into {} resource \"{}\"",
                        other.kind().label(),
                        other.name()
                    ),
                });
            }
            None => {
                return Err(ToposError::UnknownResource {
                    name: self.name().to_string(),
                });
            }
        }
        self.try_with_annotation(Annotation::Relation(Relation::new(
            component,
            RelationRole::Component,
        )))
    }
}

fn write_component(context: &mut ManifestContext<'_>) -> Result<()> {
    let ResourceKind::Component { component_type } = context.resource().kind() else {
        return Err(ToposError::MissingConfiguration {
            resource: context.resource().name().to_string(),
            what: "dapr component type".into(),
        });
    };
    let mut component = Map::new();
    let _ = component.insert("type".into(), Value::from(component_type.as_str()));

    context.write_type(DAPR_COMPONENT_V0)?;
    context.write_field("daprComponent", Value::Object(component))
}

fn write_sidecar(context: &mut ManifestContext<'_>) -> Result<()> {
    let resource = context.resource();
    let ResourceKind::Sidecar { app_id } = resource.kind() else {
        return Err(ToposError::MissingConfiguration {
            resource: resource.name().to_string(),
            what: "sidecar options".into(),
        });
    };
    let application = context
        .related_names(RelationRole::Application)?
        .into_iter()
        .next()
        .ok_or_else(|| ToposError::MissingConfiguration {
            resource: resource.name().to_string(),
            what: "target application".into(),
        })?;
    let components = context.related_names(RelationRole::Component)?;

    let mut dapr = Map::new();
    let _ = dapr.insert("application".into(), Value::from(application));
    let _ = dapr.insert(
        "appId".into(),
        Value::from(app_id.as_deref().unwrap_or_else(|| resource.name())),
    );
    let _ = dapr.insert("components".into(), Value::from(components));

    context.write_type(DAPR_V0)?;
    context.write_field("dapr", Value::Object(dapr))
}
