//! CLI entrypoint for relay-agent
//!
//! Wires the provider registry, capability aggregator and model backend
//! together for one turn, or serves a built-in provider on stdio.

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use relay_agent::agent::{Orchestrator, Turn};
use relay_agent::cli::{resolve_prompt, Cli, Command, EventWriter};
use relay_agent::config::{AppConfig, BackendConfig};
use relay_agent::llm::AnthropicProvider;
use relay_agent::logging;
use relay_agent::mcp::{CapabilityAggregator, ProcessLauncher, ProviderRegistry, StdioServer};
use relay_agent::tools::{BuiltinProvider, OrderIdStrategy};
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::discover(cli.config.as_deref()).context("Failed to load configuration")?;

    // Held until exit so the log file is flushed
    let _log_guard = logging::init_logging(&config.logging)?;

    match cli.command {
        Command::Run { prompt, payload } => {
            let stdin = match (&prompt, &payload) {
                (None, None) => read_stdin().await?,
                _ => None,
            };
            let prompt = resolve_prompt(
                prompt,
                payload.as_deref(),
                stdin.as_deref(),
                &config.agent.default_prompt,
            )?;
            run_turn(config, prompt).await
        }
        Command::Tools => list_tools(config).await,
        Command::Provider { name, order_ids } => serve_provider(name, order_ids).await,
    }
}

/// Piped stdin, or nothing when attached to a terminal
async fn read_stdin() -> Result<Option<String>> {
    if std::io::stdin().is_terminal() {
        return Ok(None);
    }

    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("Failed to read payload from stdin")?;
    Ok(Some(text))
}

fn build_backend(config: &BackendConfig) -> Result<AnthropicProvider> {
    Ok(AnthropicProvider::from_env(&config.api_key_env)?
        .with_model(config.model.clone())
        .with_max_tokens(config.max_tokens)
        .with_api_base(config.api_base.clone())
        .with_temperature(config.temperature))
}

async fn run_turn(config: AppConfig, prompt: String) -> Result<ExitCode> {
    tracing::info!("=== relay-agent starting ===");

    let llm = Arc::new(build_backend(&config.backend)?);
    let registry = ProviderRegistry::open(&config.providers, &ProcessLauncher).await?;
    tracing::info!("Opened {} provider(s)", registry.len());

    let tools = CapabilityAggregator::collect(registry.connections())
        .await
        .with_call_timeout(config.tools.call_timeout());
    tracing::info!("Aggregated {} tool(s)", tools.len());

    let orchestrator = Orchestrator::new(llm, Arc::new(tools), config.agent.clone());
    let mut turn = orchestrator.begin_turn(prompt);

    let cancel = turn.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling turn");
            cancel.cancel();
        }
    });

    let streamed = write_events(&mut turn).await;
    let cancelled = turn.is_cancelled();

    interrupt.abort();
    drop(turn);
    drop(orchestrator);

    let failures = registry.close().await;
    if !failures.is_empty() {
        tracing::warn!("{} provider(s) failed to release", failures.len());
    }

    tracing::info!("=== relay-agent finished ===");
    Ok(match streamed? {
        TurnOutcome::Failed => ExitCode::FAILURE,
        TurnOutcome::Finished if cancelled => ExitCode::from(130),
        TurnOutcome::Finished => ExitCode::SUCCESS,
    })
}

enum TurnOutcome {
    Finished,
    Failed,
}

/// Print the turn's events to stdout until it ends
async fn write_events(turn: &mut Turn) -> Result<TurnOutcome> {
    let mut writer = EventWriter::new(std::io::stdout().lock());

    while let Some(event) = turn.next().await {
        match event {
            Ok(event) => writer.write_event(&event)?,
            Err(e) => {
                tracing::error!("Turn failed: {}", e);
                writer.write_failure(&e)?;
                return Ok(TurnOutcome::Failed);
            }
        }
    }

    Ok(TurnOutcome::Finished)
}

async fn list_tools(config: AppConfig) -> Result<ExitCode> {
    let listing = ProviderRegistry::with_open(&config.providers, &ProcessLauncher, |registry| async move {
        let tools = CapabilityAggregator::collect(registry.connections()).await;
        serde_json::json!({
            "tools": tools
                .tool_names()
                .into_iter()
                .filter_map(|name| {
                    tools.get(&name).map(|d| {
                        serde_json::json!({
                            "name": name,
                            "provider": d.provider(),
                            "description": d.description,
                        })
                    })
                })
                .collect::<Vec<_>>(),
            "collisions": tools.collisions(),
        })
    })
    .await?;

    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(ExitCode::SUCCESS)
}

async fn serve_provider(provider: BuiltinProvider, order_ids: OrderIdStrategy) -> Result<ExitCode> {
    tracing::info!("Serving {} provider (order ids: {})", provider, order_ids);

    StdioServer::new(provider.registry(order_ids)).serve_stdio().await?;
    Ok(ExitCode::SUCCESS)
}
