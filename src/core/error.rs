//! Error types shared across the relay
//!
//! Failures local to one provider or one tool call are converted into
//! structured tool results and never reach the caller of a turn. Only
//! registry-open failures and backend failures propagate.

use thiserror::Error;

/// Errors raised while opening or closing the provider registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A provider process could not be launched or connected
    #[error("Provider '{name}' failed to launch: {cause}")]
    ProviderLaunchFailed {
        /// Name of the provider from its configuration
        name: String,
        /// Underlying launch failure
        cause: String,
    },

    /// A provider connection could not be released cleanly
    #[error("Provider '{name}' failed to release: {cause}")]
    ProviderReleaseFailed {
        /// Name of the provider from its configuration
        name: String,
        /// Underlying release failure
        cause: String,
    },

    /// Two enabled providers share the same name
    #[error("Duplicate provider name: {0}")]
    DuplicateProvider(String),
}

/// Errors encountered while dispatching a tool call
///
/// These never escape the aggregator: they are folded into a failed
/// `ToolInvocationResult` so the model can narrate them.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The model asked for a tool that is not in the aggregated set
    #[error("Unknown tool requested: {0}")]
    UnknownToolRequested(String),

    /// The owning provider failed to answer the call
    #[error("Tool '{tool}' dispatch failed: {cause}")]
    ToolDispatchFailed {
        /// Qualified tool name
        tool: String,
        /// Underlying failure
        cause: String,
    },
}

/// Terminal failures of a conversational turn
#[derive(Error, Debug)]
pub enum TurnError {
    /// The model backend request or its event stream failed
    #[error("Backend stream failed: {0}")]
    BackendStreamFailed(String),
}

impl TurnError {
    /// Create a backend failure from any displayable cause
    pub fn backend(cause: impl std::fmt::Display) -> Self {
        TurnError::BackendStreamFailed(cause.to_string())
    }
}

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        /// Path that was read
        path: String,
        /// IO failure
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A provider entry is malformed
    #[error("Invalid provider entry #{index}: {reason}")]
    InvalidProvider {
        /// Position of the entry in the file (0-based)
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Any other invalid value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for turn operations
pub type TurnResult<T> = Result<T, TurnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::ProviderLaunchFailed {
            name: "grocery".into(),
            cause: "no such file".into(),
        };
        assert_eq!(
            err.to_string(),
            "Provider 'grocery' failed to launch: no such file"
        );

        let err = DispatchError::UnknownToolRequested("nonexistent".into());
        assert_eq!(err.to_string(), "Unknown tool requested: nonexistent");
    }

    #[test]
    fn test_turn_error_from_display() {
        let err = TurnError::backend("connection reset");
        assert!(matches!(err, TurnError::BackendStreamFailed(ref m) if m == "connection reset"));
    }
}
