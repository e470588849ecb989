//! # topos-sdk
//!
//! Resource integrations built on the `topos-compose` engine.
//!
//! Provides extension traits for the application graph and its builders:
//! - [`MySqlExt`](mysql::MySqlExt) / [`MySqlBuilderExt`](mysql::MySqlBuilderExt):
//!   MySQL server containers, external connections, and databases.
//! - [`DaprExt`](dapr::DaprExt) / [`DaprBuilderExt`](dapr::DaprBuilderExt):
//!   Dapr components and sidecars attached to projects.
//!
//! # Example
//!
//! ```rust
//! use topos_compose::graph::ApplicationGraph;
//! use topos_sdk::prelude::*;
//!
//! # fn main() -> topos_common::error::Result<()> {
//! let graph = ApplicationGraph::new();
//! let server = graph.add_mysql_container("mysql", Some(3306), None)?;
//! let _catalog = server.add_database("catalog")?;
//!
//! let manifest = graph.publish()?;
//! assert_eq!(
//!     manifest.record("catalog").and_then(|r| r["parent"].as_str()),
//!     Some("mysql")
//! );
//! # Ok(())
//! # }
//! ```

pub mod dapr;
pub mod mysql;

/// Glob import of every extension trait.
pub mod prelude {
    pub use crate::dapr::{DaprBuilderExt, DaprExt, DaprSidecarOptions};
    pub use crate::mysql::{MySqlBuilderExt, MySqlExt};
}
