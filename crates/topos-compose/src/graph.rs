//! The application graph: every resource registered for one application.
//!
//! [`ApplicationGraph`] is a cheap-to-clone handle to shared state. Builders
//! hold a clone of it plus the name of their resource, so a dependent
//! resource added through any builder lands in the same graph and is subject
//! to the same uniqueness check and manifest walk.
//!
//! The graph is single-threaded (`Rc<RefCell<_>>`). It is open for
//! registration until the first [`ApplicationGraph::publish`] call seals it;
//! after that, registration and annotation edits fail with `GraphSealed`.
//! Edits made through the infallible builder chain cannot return that error
//! themselves, so it is held by the graph and returned by the next publish.
//! Publishing a sealed graph again is allowed and yields an identical
//! manifest.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use topos_common::config::PublishConfig;
use topos_common::error::{Result, ToposError};

use crate::annotation::{Annotation, ContainerImage};
use crate::builder::ResourceBuilder;
use crate::credential::{CredentialSource, RandomCredentials};
use crate::dependency::DependencyGraph;
use crate::manifest::{self, Manifest, ManifestWriter};
use crate::resource::{Resource, ResourceLookup};

/// Shared state behind an [`ApplicationGraph`] handle.
#[derive(Debug)]
pub(crate) struct GraphState {
    resources: IndexMap<String, Resource>,
    credentials: Box<dyn CredentialSource>,
    config: PublishConfig,
    sealed: bool,
}

impl GraphState {
    pub(crate) fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub(crate) const fn config(&self) -> &PublishConfig {
        &self.config
    }

    fn check_available(&self, name: &str) -> Result<()> {
        if self.sealed {
            return Err(ToposError::GraphSealed {
                name: name.to_string(),
            });
        }
        if self.resources.contains_key(name) {
            return Err(ToposError::DuplicateResourceName {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

impl ResourceLookup for GraphState {
    fn lookup(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    fn host(&self) -> &str {
        &self.config.host
    }
}

/// Handle to the set of resources making up one application definition.
#[derive(Debug, Clone)]
pub struct ApplicationGraph {
    state: Rc<RefCell<GraphState>>,
    rejected: Rc<RefCell<Vec<ToposError>>>,
}

impl ApplicationGraph {
    /// Creates an empty graph generating random credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::with_credentials(RandomCredentials)
    }

    /// Creates an empty graph drawing credentials from `source`.
    pub fn with_credentials(source: impl CredentialSource + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(GraphState {
                resources: IndexMap::new(),
                credentials: Box::new(source),
                config: PublishConfig::default(),
                sealed: false,
            })),
            rejected: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Replaces the publish configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` once publishing has started or while the graph is
    /// being published.
    pub fn with_config(self, config: PublishConfig) -> Result<Self> {
        {
            let mut state = self
                .state
                .try_borrow_mut()
                .map_err(|_| ToposError::Config {
                    message: "configuration changed while the graph is in use".into(),
                })?;
            if state.sealed {
                return Err(ToposError::Config {
                    message: "configuration changed after publishing".into(),
                });
            }
            state.config = config;
        }
        Ok(self)
    }

    /// Returns a copy of the publish configuration.
    pub fn config(&self) -> PublishConfig {
        self.state.borrow().config.clone()
    }

    /// Draws a credential from the graph's credential source.
    pub fn generate_credential(&self) -> String {
        self.state.borrow().credentials.generate()
    }

    /// Checks that `name` could be registered right now.
    ///
    /// Integrations call this before drawing a credential so that a rejected
    /// registration leaves the credential source untouched.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateResourceName` if the name is taken and
    /// `GraphSealed` once publishing has started.
    pub fn ensure_available(&self, name: &str) -> Result<()> {
        let Ok(state) = self.state.try_borrow() else {
            return Err(ToposError::GraphSealed {
                name: name.to_string(),
            });
        };
        state.check_available(name)
    }

    /// Registers a resource as-is and returns its builder.
    ///
    /// No publishing callback is attached; the resource must already carry
    /// one or receive one through the builder before publishing.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateResourceName` if the name is taken and
    /// `GraphSealed` once publishing has started.
    pub fn add_resource(&self, resource: Resource) -> Result<ResourceBuilder> {
        let name = resource.name().to_string();
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return Err(ToposError::GraphSealed { name });
        };
        state.check_available(&name)?;
        tracing::info!(resource = %name, kind = resource.kind().label(), "registering resource");
        let _ = state.resources.insert(name.clone(), resource);
        Ok(ResourceBuilder::new(name, self.clone()))
    }

    /// Registers a generic container published as `container.v0`.
    ///
    /// A credential is drawn from the credential source when none is given.
    ///
    /// # Errors
    ///
    /// See [`ApplicationGraph::add_resource`].
    pub fn add_container(
        &self,
        name: impl Into<String>,
        image: ContainerImage,
        credential: Option<String>,
    ) -> Result<ResourceBuilder> {
        let name = name.into();
        self.ensure_available(&name)?;
        let credential = credential.unwrap_or_else(|| self.generate_credential());
        let mut resource = Resource::container(name, credential);
        resource.add_annotation(Annotation::ContainerImage(image));
        resource.add_annotation(Annotation::publishing(manifest::write_container));
        self.add_resource(resource)
    }

    /// Registers a project published as `project.v0`.
    ///
    /// # Errors
    ///
    /// See [`ApplicationGraph::add_resource`].
    pub fn add_project(
        &self,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<ResourceBuilder> {
        let mut resource = Resource::project(name, path);
        resource.add_annotation(Annotation::publishing(manifest::write_project));
        self.add_resource(resource)
    }

    /// Returns a builder for an already registered resource.
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` if no resource has that name.
    pub fn builder_for(&self, name: &str) -> Result<ResourceBuilder> {
        if self.contains(name) {
            Ok(ResourceBuilder::new(name.to_string(), self.clone()))
        } else {
            Err(ToposError::UnknownResource {
                name: name.to_string(),
            })
        }
    }

    /// Returns true if a resource with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.state.borrow().resources.contains_key(name)
    }

    /// Returns the number of registered resources.
    pub fn len(&self) -> usize {
        self.state.borrow().resources.len()
    }

    /// Returns true if no resource is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once publishing has started.
    pub fn is_sealed(&self) -> bool {
        self.state.borrow().sealed
    }

    /// Returns a snapshot of one resource.
    pub fn resource(&self, name: &str) -> Option<Resource> {
        self.state.borrow().resources.get(name).cloned()
    }

    /// Returns resource snapshots in registration order.
    ///
    /// The sequence is lazy: each step takes a short borrow of the graph and
    /// clones one resource. Call again to restart from the beginning.
    pub fn all_resources(&self) -> impl Iterator<Item = Resource> + '_ {
        (0..).map_while(move |idx| {
            self.state
                .borrow()
                .resources
                .get_index(idx)
                .map(|(_, resource)| resource.clone())
        })
    }

    /// Returns resource names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.state.borrow().resources.keys().cloned().collect()
    }

    /// Computes the connection string of the named resource.
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` for an unregistered name, otherwise whatever
    /// [`Resource::connection_string`] reports.
    pub fn connection_string(&self, name: &str) -> Result<String> {
        let state = self.state.borrow();
        let resource = state
            .lookup(name)
            .ok_or_else(|| ToposError::UnknownResource {
                name: name.to_string(),
            })?;
        resource.connection_string(&*state)
    }

    /// Returns resource names ordered so that relation targets come first.
    ///
    /// # Errors
    ///
    /// Returns an error if relations form a cycle.
    pub fn dependency_order(&self) -> Result<Vec<String>> {
        let state = self.state.borrow();
        DependencyGraph::from_resources(state.resources()).resolve_order()
    }

    /// Seals the graph and writes the manifest.
    ///
    /// Emission is all-or-nothing: any failing resource aborts the whole
    /// publish and no manifest is returned. Builder edits rejected since the
    /// previous publish, including edits attempted from inside a publishing
    /// callback, also abort it.
    ///
    /// # Errors
    ///
    /// Returns `DanglingRelation`, `UnpublishableResource`, `InvalidRecord`,
    /// the first rejected builder edit, or any error raised by a publishing
    /// callback.
    pub fn publish(&self) -> Result<Manifest> {
        {
            let mut state = self
                .state
                .try_borrow_mut()
                .map_err(|_| ToposError::Config {
                    message: "publish called while the graph is in use".into(),
                })?;
            if !state.sealed {
                tracing::info!(count = state.resources.len(), "sealing application graph");
                state.sealed = true;
            }
        }
        let manifest = {
            let state = self.state.borrow();
            ManifestWriter::new(&state).write()
        };
        let rejected = std::mem::take(&mut *self.rejected.borrow_mut());
        if let Some(err) = rejected.into_iter().next() {
            tracing::error!(error = %err, "builder edit was rejected, publish aborted");
            return Err(err);
        }
        manifest
    }

    /// Appends an annotation to a registered resource.
    pub(crate) fn annotate(&self, name: &str, annotation: Annotation) -> Result<()> {
        let sealed = || ToposError::GraphSealed {
            name: name.to_string(),
        };
        let mut state = self.state.try_borrow_mut().map_err(|_| sealed())?;
        if state.sealed {
            return Err(sealed());
        }
        let resource = state
            .resources
            .get_mut(name)
            .ok_or_else(|| ToposError::UnknownResource {
                name: name.to_string(),
            })?;
        tracing::debug!(resource = %name, kind = annotation.kind(), "annotation attached");
        resource.add_annotation(annotation);
        Ok(())
    }

    /// Holds an error from an infallible builder call until the next publish.
    pub(crate) fn defer(&self, err: ToposError) {
        tracing::warn!(error = %err, "builder edit rejected");
        self.rejected.borrow_mut().push(err);
    }
}

impl Default for ApplicationGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use topos_common::types::RelationRole;

    use super::*;
    use crate::credential::{FixedCredentials, SequentialCredentials};

    fn project(name: &str) -> Resource {
        Resource::project(name, format!("{name}.csproj"))
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let graph = ApplicationGraph::new();
        let _ = graph.add_resource(project("api")).expect("first");
        let err = graph.add_resource(project("api")).unwrap_err();
        assert!(matches!(err, ToposError::DuplicateResourceName { ref name } if name == "api"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn all_resources_follows_registration_order_and_restarts() {
        let graph = ApplicationGraph::new();
        for name in ["c", "a", "b"] {
            let _ = graph.add_resource(project(name)).expect("register");
        }
        let first: Vec<String> = graph.all_resources().map(|r| r.name().to_string()).collect();
        let second: Vec<String> = graph.all_resources().map(|r| r.name().to_string()).collect();
        assert_eq!(first, vec!["c", "a", "b"]);
        assert_eq!(first, second);
        assert_eq!(graph.names(), first);
    }

    #[test]
    fn all_resources_is_lazy() {
        let graph = ApplicationGraph::new();
        let _ = graph.add_resource(project("a")).expect("register");
        let mut iter = graph.all_resources();
        assert_eq!(iter.next().map(|r| r.name().to_string()).as_deref(), Some("a"));
        assert!(iter.next().is_none());
    }

    #[test]
    fn builder_for_unknown_name_fails() {
        let graph = ApplicationGraph::new();
        let err = graph.builder_for("mysql").unwrap_err();
        assert!(matches!(err, ToposError::UnknownResource { .. }));
    }

    #[test]
    fn container_uses_supplied_or_generated_credential() {
        let graph = ApplicationGraph::with_credentials(FixedCredentials::new("generated"));
        let _ = graph
            .add_container("a", ContainerImage::new("redis", "7"), None)
            .expect("a");
        let _ = graph
            .add_container("b", ContainerImage::new("redis", "7"), Some("given".into()))
            .expect("b");

        let kind = |name: &str| graph.resource(name).map(|r| r.kind().clone());
        assert_eq!(
            kind("a"),
            Some(crate::resource::ResourceKind::Container {
                credential: "generated".into()
            })
        );
        assert_eq!(
            kind("b"),
            Some(crate::resource::ResourceKind::Container {
                credential: "given".into()
            })
        );
    }

    #[test]
    fn registration_after_publish_is_rejected() {
        let graph = ApplicationGraph::new();
        let _ = graph.add_project("api", "api.csproj").expect("register");
        let _ = graph.publish().expect("publish");
        assert!(graph.is_sealed());

        let err = graph.add_project("late", "late.csproj").unwrap_err();
        assert!(matches!(err, ToposError::GraphSealed { .. }));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn config_cannot_change_after_publish() {
        let graph = ApplicationGraph::new();
        let _ = graph.publish().expect("publish");
        let err = graph.clone().with_config(PublishConfig::default()).unwrap_err();
        assert!(matches!(err, ToposError::Config { .. }));
    }

    #[test]
    fn rejected_registration_leaves_credentials_untouched() {
        let graph = ApplicationGraph::with_credentials(SequentialCredentials::new("pw-"));
        let _ = graph
            .add_container("a", ContainerImage::new("redis", "7"), None)
            .expect("a");
        let err = graph
            .add_container("a", ContainerImage::new("redis", "7"), None)
            .unwrap_err();
        assert!(matches!(err, ToposError::DuplicateResourceName { .. }));
        let _ = graph
            .add_container("b", ContainerImage::new("redis", "7"), None)
            .expect("b");

        assert_eq!(
            graph.resource("b").map(|r| r.kind().clone()),
            Some(crate::resource::ResourceKind::Container {
                credential: "pw-2".into()
            })
        );
    }

    #[test]
    fn dependency_order_puts_parents_first() {
        let graph = ApplicationGraph::new();
        let _ = graph
            .add_resource(Resource::database("catalog", "server"))
            .expect("db");
        let _ = graph
            .add_resource(Resource::connection("server", Some("Server=x;".into())))
            .expect("server");
        assert_eq!(
            graph.dependency_order().expect("order"),
            vec!["server", "catalog"]
        );
        assert_eq!(
            graph
                .resource("catalog")
                .and_then(|r| r.related(RelationRole::Parent).first().map(|s| s.to_string())),
            Some("server".to_string())
        );
    }

    #[test]
    fn connection_string_for_unknown_resource() {
        let graph = ApplicationGraph::new();
        let err = graph.connection_string("nope").unwrap_err();
        assert!(matches!(err, ToposError::UnknownResource { .. }));
    }
}
