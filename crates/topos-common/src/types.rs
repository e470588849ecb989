//! Domain primitive types used across the Topos workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Network protocol of a service binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Stream-oriented TCP.
    #[default]
    Tcp,
    /// Datagram-oriented UDP.
    Udp,
}

impl Protocol {
    /// Returns the manifest spelling of the protocol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a by-name relation between two resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationRole {
    /// The target is the server this resource lives on (e.g. a database's server).
    Parent,
    /// The target is a platform component attached to this resource.
    Component,
    /// The target is the application this resource runs alongside.
    Application,
}

impl fmt::Display for RelationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => write!(f, "parent"),
            Self::Component => write!(f, "component"),
            Self::Application => write!(f, "application"),
        }
    }
}
