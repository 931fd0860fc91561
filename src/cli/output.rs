//! JSON-lines event output

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::agent::ConversationEvent;
use crate::core::TurnError;

/// Writes each event as one JSON object per line
pub struct EventWriter<W: Write> {
    out: W,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FailureLine<'a> {
    Error { message: &'a str },
}

impl<W: Write> EventWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_event(&mut self, event: &ConversationEvent) -> Result<()> {
        self.write_line(event)
    }

    /// A failed turn ends with an `{"type":"error"}` line
    pub fn write_failure(&mut self, error: &TurnError) -> Result<()> {
        let message = error.to_string();
        self.write_line(&FailureLine::Error { message: &message })
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.out, value).context("Failed to encode event")?;
        self.out.write_all(b"\n").context("Failed to write event")?;
        self.out.flush().context("Failed to flush event")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines() {
        let mut writer = EventWriter::new(Vec::new());
        writer.write_event(&ConversationEvent::text("Hi")).unwrap();
        writer.write_event(&ConversationEvent::Done).unwrap();
        writer.write_failure(&TurnError::backend("HTTP 529")).unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], r#"{"type":"text_delta","content":"Hi"}"#);
        assert_eq!(lines[1], r#"{"type":"done"}"#);
        assert!(lines[2].starts_with(r#"{"type":"error","message":"#));
        assert!(lines[2].contains("HTTP 529"));
    }
}
