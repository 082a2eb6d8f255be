//! Agent loop state management
//!
//! Tracks one `execute()` run: the current phase, the iteration counter, the
//! continuation policy inputs, and everything accumulated for the result.

use crate::agent::result::{ContextUsage, ToolCallResult};
use crate::core::AgentConfig;

/// Phase of the think / act / observe loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    Initializing,
    Thinking,
    ApiCall,
    Parsing,
    ExecutingTools,
    Completed,
    Failed,
}

impl AgentPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentPhase::Completed | AgentPhase::Failed)
    }
}

/// Per-call options of `execute()`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Chain onto the existing history instead of re-initializing
    pub continue_from_context: bool,
    /// Text injected as a continuation note
    pub prior_context: Option<String>,
    /// Refuse a tool-free answer until at least one tool has run
    pub require_tool_execution: bool,
    /// Refuse a tool-free answer before this many iterations
    pub min_iterations: usize,
}

impl ExecutionOptions {
    /// Options seeded from the agent configuration
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            continue_from_context: false,
            prior_context: None,
            require_tool_execution: config.require_tool_execution,
            min_iterations: config.min_iterations,
        }
    }

    pub fn continuing(mut self) -> Self {
        self.continue_from_context = true;
        self
    }

    pub fn with_prior_context(mut self, prior: impl Into<String>) -> Self {
        self.prior_context = Some(prior.into());
        self
    }

    pub fn requiring_tools(mut self, required: bool) -> Self {
        self.require_tool_execution = required;
        self
    }

    pub fn with_min_iterations(mut self, min: usize) -> Self {
        self.min_iterations = min;
        self
    }
}

/// State of one agent run
#[derive(Debug, Clone)]
pub struct AgentLoopState {
    pub phase: AgentPhase,
    /// Iterations started so far (1-based once the loop runs)
    pub iteration: usize,
    pub max_iterations: usize,
    /// At least one tool directive has been executed in this run
    pub tool_executed: bool,
    pub final_response: String,
    pub tool_calls: Vec<ToolCallResult>,
    pub files_created: Vec<String>,
    pub context_usage: ContextUsage,
}

impl AgentLoopState {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            phase: AgentPhase::Initializing,
            iteration: 0,
            max_iterations,
            tool_executed: false,
            final_response: String::new(),
            tool_calls: Vec::new(),
            files_created: Vec::new(),
            context_usage: ContextUsage::default(),
        }
    }

    /// Check if another iteration may start
    pub fn should_continue(&self) -> bool {
        !self.phase.is_terminal() && self.iteration < self.max_iterations
    }

    /// Start the next iteration
    pub fn next_iteration(&mut self) -> usize {
        self.iteration += 1;
        self.phase = AgentPhase::Thinking;
        self.iteration
    }

    /// Whether a response without tool calls must be rejected
    pub fn must_continue_without_tools(&self, options: &ExecutionOptions) -> bool {
        (options.require_tool_execution && !self.tool_executed)
            || self.iteration < options.min_iterations
    }

    /// Record a tool outcome and any files it reported
    pub fn record_tool_call(&mut self, result: ToolCallResult, files: Vec<String>) {
        for file in files {
            if !self.files_created.contains(&file) {
                self.files_created.push(file);
            }
        }
        self.tool_calls.push(result);
    }

    pub fn complete(&mut self, final_response: impl Into<String>) {
        self.final_response = final_response.into();
        self.phase = AgentPhase::Completed;
    }
}
