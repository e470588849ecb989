//! Publish-time configuration.

use serde::{Deserialize, Serialize};

/// Settings consumed while reading resource configuration and emitting the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Host name placed into synthesized connection strings.
    pub host: String,
    /// Whether the rendered manifest is pretty-printed.
    pub pretty: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            host: crate::constants::DEFAULT_HOST.to_string(),
            pretty: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: PublishConfig = serde_yaml::from_str("pretty: false").expect("parse");
        assert_eq!(config.host, "localhost");
        assert!(!config.pretty);
    }
}
