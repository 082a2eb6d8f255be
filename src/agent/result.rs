//! Results returned by one `execute()` call

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ContextBuildResult;
use crate::tools::ToolInputs;

/// Outcome of one parsed tool directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub tool_id: String,
    pub display_name: String,
    pub inputs: ToolInputs,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Loop iteration the call ran in
    pub iteration: usize,
}

impl ToolCallResult {
    pub fn succeeded(
        tool_id: impl Into<String>,
        display_name: impl Into<String>,
        inputs: ToolInputs,
        output: Value,
        iteration: usize,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            display_name: display_name.into(),
            inputs,
            success: true,
            output: Some(output),
            error: None,
            iteration,
        }
    }

    pub fn failed(
        tool_id: impl Into<String>,
        display_name: impl Into<String>,
        inputs: ToolInputs,
        error: impl Into<String>,
        iteration: usize,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            display_name: display_name.into(),
            inputs,
            success: false,
            output: None,
            error: Some(error.into()),
            iteration,
        }
    }
}

/// How the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStatus {
    /// A tool-free response was accepted as the final answer
    Completed,
    /// `max_iterations` ran out while the agent still requested tools
    IterationLimitReached,
    /// The LLM or the summarizer failed
    Failed,
}

/// Context statistics over the whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextUsage {
    /// Estimate of the most recent prompt
    pub token_estimate: usize,
    /// Any prompt in the run used a summary
    pub summarized: bool,
    /// Summarizer calls across the run
    pub summarization_folds: usize,
    /// Prompts that stayed above the budget after assembly
    pub over_budget_builds: usize,
}

impl ContextUsage {
    /// Fold one context build into the running statistics
    pub fn observe(&mut self, build: &ContextBuildResult) {
        self.token_estimate = build.token_estimate;
        self.summarized |= build.summarized;
        self.summarization_folds += build.folds;
        if build.over_budget {
            self.over_budget_builds += 1;
        }
    }
}

/// Terminal output of one `execute()` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub status: ExecutionStatus,
    pub final_response: String,
    pub tool_calls: Vec<ToolCallResult>,
    pub files_created: Vec<String>,
    pub iterations: usize,
    pub elapsed: Duration,
    pub context_usage: ContextUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn failed_tool_calls(&self) -> impl Iterator<Item = &ToolCallResult> {
        self.tool_calls.iter().filter(|c| !c.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(summarized: bool, folds: usize, over_budget: bool) -> ContextBuildResult {
        ContextBuildResult {
            messages: Vec::new(),
            token_estimate: 100 + folds,
            summarized,
            folds,
            cache_hit: false,
            over_budget,
        }
    }

    #[test]
    fn usage_accumulates_across_builds() {
        let mut usage = ContextUsage::default();
        usage.observe(&build(false, 0, false));
        usage.observe(&build(true, 2, true));
        usage.observe(&build(true, 0, false));

        assert!(usage.summarized);
        assert_eq!(usage.summarization_folds, 2);
        assert_eq!(usage.over_budget_builds, 1);
        assert_eq!(usage.token_estimate, 100);
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&ExecutionStatus::IterationLimitReached).unwrap();
        assert_eq!(json, "\"iteration-limit-reached\"");
    }
}
