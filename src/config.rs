//! Application configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [agent]
//! system_prompt = "You are a helpful shopping assistant."
//! max_tool_iterations = 25
//!
//! [backend]
//! model = "claude-sonnet-4-5"
//! api_key_env = "ANTHROPIC_API_KEY"
//!
//! [tools]
//! call_timeout_ms = 30000
//!
//! [logging]
//! level = "info"
//! format = "text"
//!
//! [[providers]]
//! name = "grocery"
//! command = "relay-agent"
//! args = ["provider", "grocery"]
//! ```
//!
//! Providers are listed in priority order. When two expose the same tool name
//! the earlier one keeps it; both built-in providers offer `place_order`, so
//! with grocery listed first the food provider's `place_order` is unreachable.
//!
//! Every section is optional; missing values take their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agent::AgentConfig;
use crate::core::ConfigError;
use crate::llm::anthropic::{DEFAULT_API_BASE, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::mcp::{validate_providers, ProviderConfig};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "relay-agent.toml";

/// Model backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub model: String,
    pub max_tokens: u32,
    pub api_base: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: Option<f32>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            temperature: None,
        }
    }
}

/// Tool dispatch settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Per-call timeout in milliseconds (unset waits indefinitely)
    pub call_timeout_ms: Option<u64>,
}

impl ToolsConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings (`RUST_LOG` overrides `level`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Directory for a daily rolling log file, in addition to stderr
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            directory: None,
        }
    }
}

/// Root of the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub backend: BackendConfig,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
    pub providers: Vec<ProviderConfig>,
}

impl AppConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `path` if given, else `relay-agent.toml` if present, else defaults
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values that would only fail later
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_providers(&self.providers)?;

        if self.agent.max_tool_iterations == 0 {
            return Err(ConfigError::Invalid(
                "agent.max_tool_iterations cannot be 0".to_string(),
            ));
        }
        if self.backend.max_tokens == 0 {
            return Err(ConfigError::Invalid("backend.max_tokens cannot be 0".to_string()));
        }
        if self.backend.model.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.model cannot be empty".to_string()));
        }
        if self.tools.call_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("tools.call_timeout_ms cannot be 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[agent]
max_tool_iterations = 5
emit_tool_events = false

[backend]
model = "claude-haiku-4-5"

[tools]
call_timeout_ms = 1500

[logging]
format = "json"

[[providers]]
name = "grocery"
command = "relay-agent"
args = ["provider", "grocery"]

[[providers]]
name = "food"
command = "relay-agent"
args = ["provider", "food"]
enabled = false
"#;

    #[test]
    fn test_parse_full_file() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.agent.max_tool_iterations, 5);
        assert!(!config.agent.emit_tool_events);
        assert_eq!(config.agent.default_prompt, "Hello");
        assert_eq!(config.backend.model, "claude-haiku-4-5");
        assert_eq!(config.backend.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.tools.call_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.providers.len(), 2);
        assert!(!config.providers[1].enabled);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_malformed_entries_fail() {
        let dup = "[[providers]]\nname = \"a\"\ncommand = \"x\"\n[[providers]]\nname = \"a\"\ncommand = \"y\"\n";
        assert!(matches!(
            AppConfig::from_toml_str(dup),
            Err(ConfigError::InvalidProvider { index: 1, .. })
        ));

        let missing_command = "[[providers]]\nname = \"a\"\n";
        assert!(matches!(
            AppConfig::from_toml_str(missing_command),
            Err(ConfigError::Parse(_))
        ));

        assert!(matches!(
            AppConfig::from_toml_str("[agent]\nmax_tool_iterations = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.providers[0].name, "grocery");

        let missing = AppConfig::load(Path::new("/nonexistent/relay-agent.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
