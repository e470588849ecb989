//! # topos-compose
//!
//! The resource composition and manifest-emission engine.
//!
//! Handles:
//! - **Annotation**: typed metadata attached to resources (bindings, images,
//!   environment, relations, publishing callbacks).
//! - **Resource**: named graph nodes and their kind-specific configuration.
//! - **Graph**: the shared application graph with name uniqueness and
//!   registration order.
//! - **Builder**: fluent handles that mutate one registered resource.
//! - **Dependency**: relation-derived ordering of resources.
//! - **Manifest**: the all-or-nothing writer producing the manifest document.
//!
//! # Example
//!
//! ```rust
//! use topos_compose::annotation::ServiceBinding;
//! use topos_compose::graph::ApplicationGraph;
//!
//! # fn main() -> topos_common::error::Result<()> {
//! let graph = ApplicationGraph::new();
//! let _api = graph
//!     .add_project("api", "../Api/Api.csproj")?
//!     .with_service_binding(ServiceBinding::http("http"))
//!     .with_environment("RUST_LOG", "info");
//!
//! let manifest = graph.publish()?;
//! assert!(manifest.resources.contains_key("api"));
//! # Ok(())
//! # }
//! ```

pub mod annotation;
pub mod builder;
pub mod credential;
pub mod dependency;
pub mod graph;
pub mod manifest;
pub mod resource;
pub mod value;
