//! # topos-common
//!
//! Shared types, error definitions, publish configuration, and manifest
//! schema constants used across the entire Topos workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the primitives that the composition engine,
//! the resource integrations, and the CLI build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
