//! Provider Configuration
//!
//! Launch configuration for tool provider processes

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::core::ConfigError;

/// Configuration for a single tool provider process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique name of this provider
    pub name: String,

    /// Executable to launch
    pub command: String,

    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables for the process
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Whether this provider is launched
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    /// Create a new enabled provider configuration
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            enabled: true,
        }
    }

    /// Set the process arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set whether this provider is enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Command line as one string, for logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Check a list of provider entries for malformed or duplicate names
///
/// Disabled entries are validated too, since a typo there is still a typo.
pub fn validate_providers(providers: &[ProviderConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for (index, provider) in providers.iter().enumerate() {
        if provider.name.trim().is_empty() {
            return Err(ConfigError::InvalidProvider {
                index,
                reason: "name is empty".to_string(),
            });
        }
        if provider.command.trim().is_empty() {
            return Err(ConfigError::InvalidProvider {
                index,
                reason: format!("provider '{}' has an empty command", provider.name),
            });
        }
        if !seen.insert(provider.name.as_str()) {
            return Err(ConfigError::InvalidProvider {
                index,
                reason: format!("duplicate provider name '{}'", provider.name),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ProviderConfig::new("grocery", "relay-agent")
            .with_args(["provider", "grocery"])
            .with_env("RUST_LOG", "warn")
            .with_enabled(false);

        assert_eq!(config.command_line(), "relay-agent provider grocery");
        assert_eq!(config.env.get("RUST_LOG").map(String::as_str), Some("warn"));
        assert!(!config.enabled);
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ProviderConfig =
            toml::from_str("name = \"food\"\ncommand = \"python\"").unwrap();
        assert!(config.enabled);
        assert!(config.args.is_empty());
        assert!(config.env.is_empty());
    }

    #[test]
    fn test_validation() {
        let ok = vec![ProviderConfig::new("a", "x"), ProviderConfig::new("b", "y")];
        assert!(validate_providers(&ok).is_ok());

        let dup = vec![
            ProviderConfig::new("a", "x"),
            ProviderConfig::new("a", "y").with_enabled(false),
        ];
        match validate_providers(&dup) {
            Err(ConfigError::InvalidProvider { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected duplicate error, got {:?}", other),
        }

        let empty_cmd = vec![ProviderConfig::new("a", "  ")];
        assert!(validate_providers(&empty_cmd).is_err());

        let empty_name = vec![ProviderConfig::new("", "x")];
        assert!(validate_providers(&empty_name).is_err());
    }
}
