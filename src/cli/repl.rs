//! Interactive REPL for Foldwise
//!
//! Every goal after the first chains onto the same session history.

use std::io::{self, BufRead, Write};

use crate::agent::{ExecutionOptions, ExecutionStatus, Orchestrator};
use crate::cli::commands::{handle_command, CommandResult};
use crate::cli::session::{build_orchestrator, check_backend, render_result};
use crate::core::{Config, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    config: Config,
    orchestrator: Orchestrator,
    /// The last goal completed, so the next one may chain onto it
    chained: bool,
}

impl Repl {
    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let orchestrator = build_orchestrator(&config)?;
        Ok(Self {
            config,
            orchestrator,
            chained: false,
        })
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        print!("Checking Ollama...");
        io::stdout().flush()?;
        match check_backend(&self.config).await {
            Ok(()) => println!(" Ready!\n"),
            Err(e) => {
                println!("\n\nInitialization Error: {}\n", e);
                return Ok(());
            }
        }

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("Goal: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, &mut self.orchestrator, &self.config) {
                CommandResult::Exit => {
                    println!("\nGoodbye!");
                    break;
                }
                CommandResult::Clear => {
                    self.chained = false;
                    println!("Session cleared.\n");
                }
                CommandResult::Handled(output) => println!("{}\n", output),
                CommandResult::Continue(goal) => self.run_goal(&goal).await,
            }
        }

        Ok(())
    }

    async fn run_goal(&mut self, goal: &str) {
        let mut options = ExecutionOptions::from_config(&self.config.agent);
        if self.chained {
            options = options.continuing();
        }

        println!();
        let result = self.orchestrator.execute(goal, options).await;
        self.chained = result.status != ExecutionStatus::Failed;

        let streamed = self.config.streaming.enabled;
        println!("\n{}\n", render_result(&result, streamed));
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = &self.config;

        println!(
            r#"
╔═══════════════════════════════════════════════╗
║                                               ║
║   FOLDWISE                                    ║
║   Budgeted tool-calling agent                 ║
║                                               ║
╚═══════════════════════════════════════════════╝
"#
        );
        println!("Ollama:     {}", config.ollama_url());
        println!("Model:      {}", config.model.name);
        println!("Summarizer: {}", config.summarizer_model());
        println!("Workspace:  {}", config.tools.workspace_root.display());
        println!(
            "Budget:     {} tokens (pages of {}, recency window {})",
            config.context.token_budget, config.context.page_budget, config.context.recency_window
        );
        println!();
        println!("Commands: help, clear, status, config, exit");
        println!("───────────────────────────────────────────────");
    }
}
