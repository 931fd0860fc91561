//! Turn input
//!
//! A turn is started from a JSON payload `{"prompt": "..."}`. Unknown fields
//! are ignored; a missing or null prompt falls back to the configured default.

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl Payload {
    /// Parse a payload; blank input is an empty payload
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(text).context("Invalid payload: expected {\"prompt\": \"...\"}")
    }

    pub fn prompt_or(self, default: &str) -> String {
        self.prompt.unwrap_or_else(|| default.to_string())
    }
}

/// Resolve the prompt from, in order: `--prompt`, `--payload`, stdin text
pub fn resolve_prompt(
    prompt: Option<String>,
    payload: Option<&str>,
    stdin: Option<&str>,
    default: &str,
) -> Result<String> {
    if let Some(prompt) = prompt {
        return Ok(prompt);
    }

    match payload.or(stdin) {
        Some(text) => Ok(Payload::parse(text)?.prompt_or(default)),
        None => Ok(default.to_string()),
    }
}
