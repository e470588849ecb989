//! Unified error types for the Topos workspace.
//!
//! Graph construction and manifest emission are deterministic and purely
//! in-memory, so none of these errors is transient: every variant is
//! surfaced to the caller as-is and never retried.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::RelationRole;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ToposError {
    /// A resource with the same name is already registered in the graph.
    #[error("duplicate resource name: \"{name}\"")]
    DuplicateResourceName {
        /// The colliding name.
        name: String,
    },

    /// A resource was queried for data it was never given.
    #[error("resource \"{resource}\" is missing configuration: {what}")]
    MissingConfiguration {
        /// Resource that was queried.
        resource: String,
        /// Description of the missing piece.
        what: String,
    },

    /// A resource has no manifest publishing callback.
    #[error("resource \"{name}\" has no manifest publishing callback")]
    UnpublishableResource {
        /// Resource that cannot be published.
        name: String,
    },

    /// A relation points at a name that is not registered in the graph.
    #[error("resource \"{resource}\" references unknown {role} \"{target}\"")]
    DanglingRelation {
        /// Resource carrying the relation.
        resource: String,
        /// Name that could not be resolved.
        target: String,
        /// Role of the relation.
        role: RelationRole,
    },

    /// A lookup by name found nothing.
    #[error("resource not found: \"{name}\"")]
    UnknownResource {
        /// Name that was looked up.
        name: String,
    },

    /// Registration was attempted after the graph started publishing.
    #[error("cannot register \"{name}\": the application graph is sealed for publishing")]
    GraphSealed {
        /// Name of the rejected resource.
        name: String,
    },

    /// A publishing callback produced a structurally invalid record.
    #[error("invalid manifest record for \"{resource}\": {message}")]
    InvalidRecord {
        /// Resource whose record is invalid.
        resource: String,
        /// What is wrong with the record.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ToposError>;
