//! Command-line surface
//!
//! - `Cli` / `Command`: clap definitions
//! - `resolve_prompt`: turn input from flags, payload or stdin
//! - `EventWriter`: JSON-lines rendering of a turn

mod commands;
mod output;
mod payload;

pub use commands::{Cli, Command};
pub use output::EventWriter;
pub use payload::{resolve_prompt, Payload};
