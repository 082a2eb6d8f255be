//! Session wiring shared by the REPL and single-goal mode

use std::io::{self, Write};
use std::sync::Arc;

use crate::agent::{ExecutionResult, ExecutionStatus, LoggingListener, Orchestrator, OrchestratorBuilder};
use crate::core::{Config, FoldwiseError, Result};
use crate::llm::{LLMProvider, OllamaClient, ProviderModel, StreamCallback};
use crate::tools::Workspace;

/// Build an orchestrator backed by Ollama and the workspace file tools
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let provider: Arc<dyn LLMProvider> = Arc::new(OllamaClient::from_config(config)?);

    let mut model = ProviderModel::new(Arc::clone(&provider), &config.model.name)
        .with_temperature(config.model.temperature);
    if config.streaming.enabled {
        let on_token: Arc<StreamCallback> = Arc::new(|token: &str| {
            print!("{}", token);
            let _ = io::stdout().flush();
        });
        model = model.with_streaming(on_token);
    }
    let summarizer = ProviderModel::new(provider, config.summarizer_model()).with_temperature(0.0);
    let tools = Workspace::new(config.tools.workspace_root.clone()).registry();

    OrchestratorBuilder::from_config(config)
        .llm(Arc::new(model))
        .summarizer(Arc::new(summarizer))
        .tools(Arc::new(tools))
        .listener(Arc::new(LoggingListener))
        .build()
}

/// Make sure Ollama is reachable and the configured models are pulled
pub async fn check_backend(config: &Config) -> Result<()> {
    let client = OllamaClient::from_config(config)?;
    let models = client.list_models().await.map_err(|e| {
        FoldwiseError::llm_unavailable(format!("cannot reach Ollama at {}: {}", config.ollama_url(), e))
    })?;
    tracing::debug!("Available models: {:?}", models);

    for model in [config.model.name.as_str(), config.summarizer_model()] {
        if !client.is_model_available(model).await? {
            return Err(FoldwiseError::ModelNotFound(model.to_string()));
        }
    }
    Ok(())
}

/// Human-readable summary of one run
pub fn render_result(result: &ExecutionResult, streamed: bool) -> String {
    let mut out = String::new();

    if !streamed && !result.final_response.is_empty() {
        out.push_str(&result.final_response);
        out.push_str("\n\n");
    }

    for call in &result.tool_calls {
        let mark = if call.success { "✓" } else { "✗" };
        out.push_str(&format!("  {} {}", mark, call.display_name));
        if let Some(error) = &call.error {
            out.push_str(&format!(": {}", error));
        }
        out.push('\n');
    }
    if !result.files_created.is_empty() {
        out.push_str(&format!("Files: {}\n", result.files_created.join(", ")));
    }

    let status = match result.status {
        ExecutionStatus::Completed => "completed".to_string(),
        ExecutionStatus::IterationLimitReached => "stopped at the iteration limit".to_string(),
        ExecutionStatus::Failed => format!(
            "failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        ),
    };
    out.push_str(&format!(
        "[{}; {} iterations, {} tool calls, {:.1}s{}]",
        status,
        result.iterations,
        result.tool_calls.len(),
        result.elapsed.as_secs_f64(),
        if result.context_usage.summarized {
            format!(", {} summary folds", result.context_usage.summarization_folds)
        } else {
            String::new()
        }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ContextUsage, ToolCallResult};
    use crate::tools::ToolInputs;
    use std::time::Duration;

    fn result(status: ExecutionStatus) -> ExecutionResult {
        ExecutionResult {
            success: status != ExecutionStatus::Failed,
            status,
            final_response: "All done.".to_string(),
            tool_calls: vec![
                ToolCallResult::succeeded("write_file", "Write File", ToolInputs::new(), "ok".into(), 1),
                ToolCallResult::failed("read_file", "Read File", ToolInputs::new(), "missing", 1),
            ],
            files_created: vec!["notes.md".to_string()],
            iterations: 2,
            elapsed: Duration::from_millis(1500),
            context_usage: ContextUsage::default(),
            error: None,
        }
    }

    #[test]
    fn test_render_completed() {
        let text = render_result(&result(ExecutionStatus::Completed), false);
        assert!(text.starts_with("All done."));
        assert!(text.contains("✓ Write File"));
        assert!(text.contains("✗ Read File: missing"));
        assert!(text.contains("Files: notes.md"));
        assert!(text.contains("[completed; 2 iterations, 2 tool calls, 1.5s]"));
    }

    #[test]
    fn test_render_streamed_skips_answer() {
        let text = render_result(&result(ExecutionStatus::IterationLimitReached), true);
        assert!(!text.contains("All done."));
        assert!(text.contains("iteration limit"));
    }
}
