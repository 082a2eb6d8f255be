//! Agent orchestrator
//!
//! Drives one session through a ReAct-style loop (Thought → Action →
//! Observation): build a budget-fitting prompt, ask the model, parse tool
//! directives out of the answer, run them one by one and feed the results
//! back, until the model answers without tools or the iteration cap is hit.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::agent::directive::{parse_directives, DirectiveError, ToolDirective};
use crate::agent::events::{AgentProgressEvent, NoopListener, ProgressKind, ProgressListener};
use crate::agent::loop_state::{AgentLoopState, AgentPhase, ExecutionOptions};
use crate::agent::prompt::default_system_prompt;
use crate::agent::result::{ExecutionResult, ExecutionStatus, ToolCallResult};
use crate::agent::truncation::TruncationPolicy;
use crate::context::{ContextManager, Summarizer, TokenEstimator};
use crate::core::{AgentConfig, Config, ContextConfig, FoldwiseError, Message, Result};
use crate::llm::LanguageModel;
use crate::tools::{ToolExecutor, ToolOutput};

/// Appended when the model answers without tools but the loop may not stop yet
pub const NUDGE_NOTE: &str =
    "You gave analysis but no tool calls. Execute at least one tool now using a ```tool block.";

/// Summarizes through the agent's own model when no dedicated summarizer is set
struct ModelSummarizer(Arc<dyn LanguageModel>);

#[async_trait]
impl Summarizer for ModelSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        self.0.complete(&[Message::user(prompt)]).await
    }
}

/// One agent session: history, collaborators and loop settings
pub struct Orchestrator {
    config: AgentConfig,
    llm: Option<Arc<dyn LanguageModel>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    tools: Arc<dyn ToolExecutor>,
    context: ContextManager,
    listener: Arc<dyn ProgressListener>,
    truncation: TruncationPolicy,
    system_prompt: String,
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    config: AgentConfig,
    context_config: ContextConfig,
    llm: Option<Arc<dyn LanguageModel>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    tools: Option<Arc<dyn ToolExecutor>>,
    estimator: Option<Arc<dyn TokenEstimator>>,
    listener: Option<Arc<dyn ProgressListener>>,
    system_prompt: Option<String>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            config: AgentConfig::default(),
            context_config: ContextConfig::default(),
            llm: None,
            summarizer: None,
            tools: None,
            estimator: None,
            listener: None,
            system_prompt: None,
        }
    }

    /// Take the agent and context sections from a loaded config
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new()
            .agent_config(config.agent.clone())
            .context_config(config.context.clone());
        builder.system_prompt = config.agent.system_prompt.clone();
        builder
    }

    pub fn agent_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn context_config(mut self, config: ContextConfig) -> Self {
        self.context_config = config;
        self
    }

    /// Set the language model driving the loop
    pub fn llm(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set a dedicated summarizer (defaults to the loop's model)
    pub fn summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Set the tool executor
    pub fn tools(mut self, tools: Arc<dyn ToolExecutor>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Replace the character-ratio token estimator
    pub fn estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Set the progress listener
    pub fn listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Override the generated system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Build the orchestrator; a tool executor is required
    pub fn build(self) -> Result<Orchestrator> {
        let tools = self
            .tools
            .ok_or_else(|| FoldwiseError::config("orchestrator needs a tool executor"))?;
        if self.config.max_iterations == 0 {
            return Err(FoldwiseError::config("agent.max_iterations must be > 0"));
        }

        let system_prompt = self
            .system_prompt
            .unwrap_or_else(|| default_system_prompt(&tools.describe()));
        let context = match self.estimator {
            Some(estimator) => ContextManager::with_estimator(self.context_config, estimator),
            None => ContextManager::new(self.context_config),
        };

        Ok(Orchestrator {
            truncation: TruncationPolicy::new(self.config.truncation.clone()),
            config: self.config,
            llm: self.llm,
            summarizer: self.summarizer,
            tools,
            context,
            listener: self.listener.unwrap_or_else(|| Arc::new(NoopListener)),
            system_prompt,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Create a builder
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Run the loop for one goal
    ///
    /// Never returns an error: fatal failures (no model, model call failed,
    /// summarizer failed) produce a result with `success == false` carrying
    /// whatever tool calls and files were accumulated before the failure.
    pub async fn execute(&mut self, goal: &str, options: ExecutionOptions) -> ExecutionResult {
        let started = Instant::now();
        let mut state = AgentLoopState::new(self.config.max_iterations);
        self.emit(ProgressKind::Initializing, format!("Starting goal: {}", goal));

        let Some(llm) = self.llm.clone() else {
            let error = FoldwiseError::llm_unavailable("no language model configured");
            return self.failure(state, started, error);
        };
        let summarizer: Arc<dyn Summarizer> = match &self.summarizer {
            Some(summarizer) => Arc::clone(summarizer),
            None => Arc::new(ModelSummarizer(Arc::clone(&llm))),
        };

        if options.continue_from_context && self.context.is_initialized() {
            self.context
                .add_continuation(goal, options.prior_context.as_deref());
        } else {
            self.context.initialize(self.system_prompt.clone(), goal);
            if let Some(prior) = options.prior_context.as_deref() {
                self.context
                    .add_context_note(format!("[Prior context]\n{}", prior));
            }
        }

        info!(
            "Starting agent loop (max {} iterations, {} entries in history)",
            state.max_iterations,
            self.context.len()
        );

        while state.should_continue() {
            let iteration = state.next_iteration();
            let step = format!("iteration {}/{}", iteration, state.max_iterations);
            self.emit(ProgressKind::Thinking, format!("Thinking ({})", step));

            let listener = Arc::clone(&self.listener);
            let on_progress = move |message: &str| {
                listener.on_event(&AgentProgressEvent::new(
                    ProgressKind::ContextSummarizing,
                    message,
                ))
            };
            let build = match self
                .context
                .build_context(&step, summarizer.as_ref(), Some(&on_progress))
                .await
            {
                Ok(build) => build,
                Err(e) => return self.failure(state, started, e),
            };
            state.context_usage.observe(&build);
            if build.over_budget {
                self.emit(
                    ProgressKind::ContextOverBudget,
                    format!(
                        "Prompt is ~{} tokens, above the budget of {}",
                        build.token_estimate,
                        self.context.config().token_budget
                    ),
                );
            }

            state.phase = AgentPhase::ApiCall;
            self.emit(
                ProgressKind::ApiCall,
                format!(
                    "Calling model with {} messages (~{} tokens{})",
                    build.messages.len(),
                    build.token_estimate,
                    if build.summarized { ", summarized" } else { "" }
                ),
            );
            let response = match llm.complete(&build.messages).await {
                Ok(response) => response,
                Err(e) => return self.failure(state, started, e),
            };

            state.phase = AgentPhase::Parsing;
            let parsed = parse_directives(&response);
            self.emit(
                ProgressKind::Parsing,
                format!("Found {} tool directive(s)", parsed.directives.len()),
            );
            for error in &parsed.errors {
                warn!("Skipping tool block: {}", error);
                self.emit(ProgressKind::DirectiveSkipped, error.to_string());
            }

            if !parsed.has_directives() {
                self.context.add_llm_response(&response, iteration);
                if state.must_continue_without_tools(&options) {
                    self.note_skipped_blocks(&parsed.errors);
                    self.context.add_context_note(NUDGE_NOTE);
                    self.emit(
                        ProgressKind::Nudge,
                        format!("No tool calls on iteration {}, asking again", iteration),
                    );
                    continue;
                }

                state.complete(response);
                self.emit(
                    ProgressKind::Completed,
                    format!("Final answer on iteration {}", iteration),
                );
                break;
            }

            state.tool_executed = true;
            self.context.add_llm_response(&response, iteration);
            self.note_skipped_blocks(&parsed.errors);

            state.phase = AgentPhase::ExecutingTools;
            for directive in parsed.directives {
                self.run_directive(&mut state, directive, iteration).await;
            }
        }

        let status = if state.phase == AgentPhase::Completed {
            ExecutionStatus::Completed
        } else {
            self.emit(
                ProgressKind::IterationLimit,
                format!(
                    "Stopped after {} iterations without a final answer",
                    state.iteration
                ),
            );
            ExecutionStatus::IterationLimitReached
        };

        info!(
            "Agent loop finished: {:?} ({} iterations, {} tool calls)",
            status,
            state.iteration,
            state.tool_calls.len()
        );

        ExecutionResult {
            success: true,
            status,
            final_response: state.final_response,
            tool_calls: state.tool_calls,
            files_created: state.files_created,
            iterations: state.iteration,
            elapsed: started.elapsed(),
            context_usage: state.context_usage,
            error: None,
        }
    }

    /// Execute one directive inside its own failure boundary
    async fn run_directive(
        &mut self,
        state: &mut AgentLoopState,
        directive: ToolDirective,
        iteration: usize,
    ) {
        let ToolDirective {
            tool_id, inputs, ..
        } = directive;
        let display_name = self.tools.display_name(&tool_id);
        self.emit(
            ProgressKind::ExecutingTool,
            format!("Running {} ({})", display_name, tool_id),
        );

        let tools = Arc::clone(&self.tools);
        let outcome = AssertUnwindSafe(tools.execute(&tool_id, &inputs))
            .catch_unwind()
            .await;
        let outcome: std::result::Result<ToolOutput, String> = match outcome {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(e.to_string()),
            Err(panic) => Err(format!("tool panicked: {}", panic_message(panic.as_ref()))),
        };

        match outcome {
            Ok(output) => {
                let text = self.truncation.apply(&tool_id, &render_output(&output.output));
                self.context.add_tool_result(
                    &tool_id,
                    &display_name,
                    format!("Tool `{}` succeeded:\n{}", tool_id, text),
                    iteration,
                );
                self.emit(ProgressKind::ToolSucceeded, format!("{} succeeded", display_name));
                let call = ToolCallResult::succeeded(
                    &tool_id,
                    &display_name,
                    inputs,
                    output.output,
                    iteration,
                );
                state.record_tool_call(call, output.files_created);
            }
            Err(error) => {
                warn!("Tool {} failed: {}", tool_id, error);
                let text = self.truncation.apply(&tool_id, &error);
                self.context.add_tool_result(
                    &tool_id,
                    &display_name,
                    format!("Tool `{}` failed: {}", tool_id, text),
                    iteration,
                );
                self.emit(
                    ProgressKind::ToolFailed,
                    format!("{} failed: {}", display_name, error),
                );
                let call =
                    ToolCallResult::failed(&tool_id, &display_name, inputs, error, iteration);
                state.record_tool_call(call, Vec::new());
            }
        }
    }

    /// Tell the model which blocks were ignored so it can resend them
    fn note_skipped_blocks(&mut self, errors: &[DirectiveError]) {
        if errors.is_empty() {
            return;
        }
        let lines: Vec<String> = errors.iter().map(|e| format!("- {}", e)).collect();
        self.context.add_context_note(format!(
            "Some tool blocks were ignored:\n{}",
            lines.join("\n")
        ));
    }

    fn failure(
        &self,
        mut state: AgentLoopState,
        started: Instant,
        error: FoldwiseError,
    ) -> ExecutionResult {
        state.phase = AgentPhase::Failed;
        self.emit(ProgressKind::Failed, error.to_string());

        ExecutionResult {
            success: false,
            status: ExecutionStatus::Failed,
            final_response: state.final_response,
            tool_calls: state.tool_calls,
            files_created: state.files_created,
            iterations: state.iteration,
            elapsed: started.elapsed(),
            context_usage: state.context_usage,
            error: Some(error.to_string()),
        }
    }

    fn emit(&self, kind: ProgressKind, message: impl Into<String>) {
        let event = AgentProgressEvent::new(kind, message);
        debug!(kind = kind.as_str(), "{}", event.message);
        self.listener.on_event(&event);
    }

    /// Session history
    pub fn context(&self) -> &ContextManager {
        &self.context
    }

    /// Drop the whole history so the next goal starts fresh
    pub fn clear_history(&mut self) {
        self.context.clear();
    }

    /// Get current agent configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }
}

fn render_output(output: &Value) -> String {
    match output {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;
    use serde_json::json;

    #[test]
    fn test_builder_requires_tools() {
        assert!(Orchestrator::builder().build().is_err());
        assert!(Orchestrator::builder()
            .tools(Arc::new(ToolRegistry::new()))
            .max_iterations(0)
            .build()
            .is_err());
    }

    #[test]
    fn test_builder_uses_prompt_override() {
        let orchestrator = Orchestrator::builder()
            .tools(Arc::new(ToolRegistry::new()))
            .system_prompt("be brief")
            .build()
            .unwrap();
        assert_eq!(orchestrator.system_prompt(), "be brief");
        assert!(!orchestrator.has_llm());
    }

    #[tokio::test]
    async fn test_missing_llm_fails_without_touching_history() {
        let mut orchestrator = Orchestrator::builder()
            .tools(Arc::new(ToolRegistry::new()))
            .build()
            .unwrap();
        let result = orchestrator
            .execute("do something", ExecutionOptions::default())
            .await;

        assert!(!result.success);
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.iterations, 0);
        assert!(result.error.unwrap().contains("LLM unavailable"));
        assert!(orchestrator.context().is_empty());
    }

    #[test]
    fn test_render_output() {
        assert_eq!(render_output(&json!("plain")), "plain");
        assert_eq!(render_output(&json!({"a": 1})), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
