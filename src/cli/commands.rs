//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::tools::{BuiltinProvider, OrderIdStrategy};

/// CLI arguments for relay-agent
#[derive(Parser, Debug)]
#[command(name = "relay-agent")]
#[command(author, version, about = "Relay conversations between a model and MCP tool providers")]
#[command(long_about = r#"
relay-agent launches the configured tool providers, merges their tools into
one set and runs a conversational turn against the model backend.

Configuration is loaded from (in priority order):
1. --config <path>      Explicit config file
2. ./relay-agent.toml   Working-directory config
3. Built-in defaults

Example:
  relay-agent run --prompt "What fruit do you have?"
  echo '{"prompt": "Order me a pizza"}' | relay-agent run
  relay-agent provider grocery --order-ids random
"#)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one conversational turn and print its events as JSON lines
    Run {
        /// Prompt text (takes precedence over --payload and stdin)
        #[arg(short, long, conflicts_with = "payload")]
        prompt: Option<String>,

        /// JSON payload of the form {"prompt": "..."}; read from stdin when omitted
        #[arg(long, value_name = "JSON")]
        payload: Option<String>,
    },

    /// List the aggregated tool set and any name collisions
    Tools,

    /// Serve a built-in tool provider over stdio
    Provider {
        /// Which provider to serve (grocery|food)
        name: BuiltinProvider,

        /// Order identifier strategy (counter|random)
        #[arg(long, value_name = "STRATEGY", default_value = "counter")]
        order_ids: OrderIdStrategy,
    },
}
