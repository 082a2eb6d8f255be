//! CLI commands
//!
//! Special commands that can be executed in the REPL. Anything else is a goal.

use crate::agent::Orchestrator;
use crate::core::Config;

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Run the input as a goal
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// History was cleared
    Clear,
}

/// Parse and handle special commands
pub fn handle_command(input: &str, orchestrator: &mut Orchestrator, config: &Config) -> CommandResult {
    let input = input.trim();
    let cmd = input.to_lowercase();

    match cmd.as_str() {
        "exit" | "quit" => CommandResult::Exit,

        "clear" => {
            orchestrator.clear_history();
            CommandResult::Clear
        }

        "help" => CommandResult::Handled(help_text()),

        "status" => CommandResult::Handled(status_text(orchestrator, config)),

        "config" => CommandResult::Handled(
            toml::to_string_pretty(config)
                .unwrap_or_else(|e| format!("Could not render configuration: {}", e)),
        ),

        _ => CommandResult::Continue(input.to_string()),
    }
}

fn status_text(orchestrator: &Orchestrator, config: &Config) -> String {
    let stats = orchestrator.context().stats();
    let summary = match orchestrator.context().cached_summary() {
        Some(summary) => format!(
            "{} entries folded (~{} tokens)",
            summary.covered_entries, summary.token_estimate
        ),
        None => "none".to_string(),
    };

    format!(
        "Foldwise Status:\n\
         ─────────────────────────────\n\
         Model:        {}\n\
         Summarizer:   {}\n\
         Workspace:    {}\n\
         History:      {} entries (~{} / {} tokens)\n\
         Summary:      {}\n\
         Iterations:   max {}, min {}\n\
         Debug:        {}",
        config.model.name,
        config.summarizer_model(),
        config.tools.workspace_root.display(),
        stats.entries,
        stats.estimated_tokens,
        stats.token_budget,
        summary,
        orchestrator.config().max_iterations,
        orchestrator.config().min_iterations,
        if orchestrator.config().debug { "on" } else { "off" }
    )
}

/// Generate help text
fn help_text() -> String {
    r#"Foldwise Commands:
─────────────────────────────────────────────
  help             Show this help message
  exit, quit       Exit Foldwise
  clear            Forget the session history
  status           Show model, history and budget usage
  config           Print the effective configuration

Anything else is treated as a goal. Goals after the first continue the
same session, so the agent can build on earlier work until you 'clear'.

Keyboard Shortcuts:
  Ctrl+D           Exit Foldwise
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;
    use std::sync::Arc;

    fn orchestrator() -> Orchestrator {
        Orchestrator::builder()
            .tools(Arc::new(ToolRegistry::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_exit_and_goals() {
        let mut orch = orchestrator();
        let config = Config::default();
        assert_eq!(handle_command("quit", &mut orch, &config), CommandResult::Exit);
        assert_eq!(handle_command(" EXIT ", &mut orch, &config), CommandResult::Exit);
        assert_eq!(
            handle_command("write a haiku", &mut orch, &config),
            CommandResult::Continue("write a haiku".to_string())
        );
    }

    #[test]
    fn test_status_and_config() {
        let mut orch = orchestrator();
        let config = Config::default();
        match handle_command("status", &mut orch, &config) {
            CommandResult::Handled(text) => {
                assert!(text.contains("History:      0 entries"));
                assert!(text.contains("Summary:      none"));
            }
            other => panic!("unexpected {:?}", other),
        }
        match handle_command("config", &mut orch, &config) {
            CommandResult::Handled(text) => assert!(text.contains("[context]")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
