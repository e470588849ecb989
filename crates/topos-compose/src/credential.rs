//! Credential generation for resources that need a secret they were not given.
//!
//! The application graph owns one [`CredentialSource`]. Production graphs use
//! [`RandomCredentials`]; tests pin values with [`FixedCredentials`] or
//! [`SequentialCredentials`] so emitted manifests are reproducible.

use std::cell::Cell;
use std::fmt;

/// Produces credentials for newly constructed resources.
pub trait CredentialSource: fmt::Debug {
    /// Returns a fresh credential.
    fn generate(&self) -> String;
}

/// Random credentials backed by UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCredentials;

impl CredentialSource for RandomCredentials {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Always returns the same credential.
#[derive(Debug, Clone)]
pub struct FixedCredentials(String);

impl FixedCredentials {
    /// Creates a source returning `value` for every request.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl CredentialSource for FixedCredentials {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

/// Returns `<prefix>1`, `<prefix>2`, ... in request order.
#[derive(Debug)]
pub struct SequentialCredentials {
    prefix: String,
    next: Cell<u64>,
}

impl SequentialCredentials {
    /// Creates a source numbering credentials from 1.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Cell::new(1),
        }
    }
}

impl CredentialSource for SequentialCredentials {
    fn generate(&self) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}{n}", self.prefix)
    }
}
