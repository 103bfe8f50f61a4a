//! Kestrel CLI entry point

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kestrel::agent::{AgentLoop, ProviderRegistry, ToolService};
use kestrel::tools::ToolRegistry;
use kestrel::ui;

#[derive(Parser)]
#[command(name = "kestrel")]
#[command(about = "Send a prompt to a chat model and let it use local tools")]
#[command(version)]
struct Cli {
    /// Prompt to send to the model
    #[arg(short, long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    prompt: String,

    /// Model override
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum number of model calls
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Show token usage
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = kestrel::config::load().context("failed to load configuration")?;

    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(max_rounds) = cli.max_rounds {
        config.max_iterations = max_rounds;
    }

    let registry = Arc::new(ToolRegistry::with_defaults(&config));
    let client = ProviderRegistry::create(&config, &registry.definitions())?;

    tracing::info!(
        "Using {} via {} with tools: {}",
        config.model,
        config.provider,
        registry.tool_names().join(", ")
    );

    let mut agent = AgentLoop::new(client, ToolService::new(registry), config.max_iterations);
    let outcome = agent.run(&cli.prompt).await?;

    for result in &outcome.tool_results {
        ui::print_tool_result(result);
    }
    if cli.verbose {
        ui::print_usage(outcome.model_calls, &outcome.usage);
    }
    if !outcome.is_complete() {
        ui::print_warning(&format!(
            "Model stopped early (finish reason: {})",
            outcome.finish_reason
        ));
    }

    if let Some(content) = outcome.content.filter(|c| !c.is_empty()) {
        println!("{}", content);
    }

    Ok(())
}
