//! Summarizer collaborator and fold prompts
//!
//! Older history is folded left to right: the first page is summarized
//! alone, every later page together with the rolling summary so far.

use async_trait::async_trait;

use crate::context::entry::WorkflowEntry;
use crate::core::Result;

/// Turns a summarization prompt into summary text (usually an LLM call)
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String>;
}

const FOLD_RULES: &str = "\
Rules:
- Keep every file and artifact name exactly as written.
- Keep key decisions and the reasons given for them.
- Keep errors and failed attempts, with their messages verbatim.
- Drop details that later entries supersede.
- Only state facts present in the input. Do not speculate.
- Write plain prose or bullet points, no preamble.";

/// Prompt for the first page of a fold
pub fn first_page_prompt(goal: &str, step_label: &str, page: &[&WorkflowEntry]) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are compressing the working history of an agent session.\n\n");
    push_goal(&mut prompt, goal, step_label);
    prompt.push_str("Summarize the following history entries so the agent can continue its work.\n\n");
    prompt.push_str(FOLD_RULES);
    prompt.push_str("\n\n=== HISTORY ===\n");
    push_page(&mut prompt, page);
    prompt.push_str("=== END HISTORY ===\n");
    prompt
}

/// Prompt merging the rolling summary with the next page
pub fn fold_prompt(
    goal: &str,
    step_label: &str,
    rolling_summary: &str,
    page: &[&WorkflowEntry],
) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are compressing the working history of an agent session.\n\n");
    push_goal(&mut prompt, goal, step_label);
    prompt.push_str(
        "Merge the existing summary with the newer history entries into one standalone \
         summary that replaces the existing one. Newer entries win where they conflict.\n\n",
    );
    prompt.push_str(FOLD_RULES);
    prompt.push_str("\n\n=== EXISTING SUMMARY ===\n");
    prompt.push_str(rolling_summary);
    prompt.push_str("\n\n=== NEWER HISTORY ===\n");
    push_page(&mut prompt, page);
    prompt.push_str("=== END HISTORY ===\n");
    prompt
}

fn push_goal(prompt: &mut String, goal: &str, step_label: &str) {
    prompt.push_str("GOAL: ");
    prompt.push_str(goal);
    prompt.push('\n');
    if !step_label.is_empty() {
        prompt.push_str("CURRENT STEP: ");
        prompt.push_str(step_label);
        prompt.push('\n');
    }
    prompt.push('\n');
}

fn push_page(prompt: &mut String, page: &[&WorkflowEntry]) {
    for entry in page {
        prompt.push_str(&entry.render_for_summary());
        prompt.push_str("\n\n");
    }
}
