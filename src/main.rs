//! Foldwise - budgeted tool-calling agent
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;

use clap::Parser;
use foldwise::agent::ExecutionOptions;
use foldwise::cli::{build_orchestrator, check_backend, render_result};
use foldwise::{Config, Repl};
use tracing_subscriber::EnvFilter;

/// Foldwise - budgeted tool-calling agent
#[derive(Parser, Debug)]
#[command(name = "foldwise")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Single goal mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Model driving the agent loop
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Maximum loop iterations per goal
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Minimum iterations before a tool-free answer is accepted
    #[arg(long)]
    min_iterations: Option<usize>,

    /// Require at least one tool call before accepting an answer
    #[arg(long)]
    require_tools: bool,

    /// Directory the file tools may touch
    #[arg(long, short = 'w')]
    workspace: Option<PathBuf>,

    /// Token budget for one prompt
    #[arg(long)]
    budget: Option<usize>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Print responses only when complete
    #[arg(long)]
    no_stream: bool,
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "foldwise=debug" } else { "foldwise=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(model) = args.model {
        config.model.name = model;
    }
    if let Some(max) = args.max_iterations {
        config.agent.max_iterations = max;
    }
    if let Some(min) = args.min_iterations {
        config.agent.min_iterations = min;
    }
    if args.require_tools {
        config.agent.require_tool_execution = true;
    }
    if let Some(workspace) = args.workspace {
        config.tools.workspace_root = workspace;
    }
    if let Some(budget) = args.budget {
        config.context.token_budget = budget;
    }
    if args.debug {
        config.agent.debug = true;
    }
    if args.no_stream {
        config.streaming.enabled = false;
    }
    config.validate()?;

    init_tracing(config.agent.debug);

    // Single goal mode
    if let Some(goal) = args.prompt {
        check_backend(&config).await?;
        let mut orchestrator = build_orchestrator(&config)?;
        let result = orchestrator
            .execute(&goal, ExecutionOptions::from_config(&config.agent))
            .await;
        println!("\n{}", render_result(&result, config.streaming.enabled));
        if !result.success {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config)?;
    repl.run().await?;

    Ok(())
}
