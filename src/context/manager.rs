//! Context manager - keeps an unbounded session inside a token budget
//!
//! The full history is append-only. When it no longer fits the budget, the
//! entries between the user goal and the recency window are paginated and
//! folded into one rolling summary, which is cached until new entries slide
//! out of the recency window.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::context::entry::{EntryCategory, EntryMetadata, WorkflowEntry};
use crate::context::summarizer::{first_page_prompt, fold_prompt, Summarizer};
use crate::context::token::{CharRatioEstimator, TokenEstimator};
use crate::core::{ContextConfig, FoldwiseError, Message, Result, Role};

/// Callback receiving human-readable progress while the context is built
pub type ContextProgress<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Rolling summary of the older entries
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSummary {
    pub text: String,
    pub token_estimate: usize,
    /// Number of older entries folded into `text`
    pub covered_entries: usize,
    pub created_at: DateTime<Utc>,
}

/// Budget-fitting message sequence produced by [`ContextManager::build_context`]
#[derive(Debug, Clone)]
pub struct ContextBuildResult {
    pub messages: Vec<Message>,
    /// Estimate for the assembled sequence, not the full history
    pub token_estimate: usize,
    /// A summary message stands in for older entries
    pub summarized: bool,
    /// Summarizer calls made during this build
    pub folds: usize,
    /// The cached summary was reused without any summarizer call
    pub cache_hit: bool,
    /// The assembled sequence is still above the token budget
    pub over_budget: bool,
}

/// Snapshot of session size for status displays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextStats {
    pub entries: usize,
    pub estimated_tokens: usize,
    pub token_budget: usize,
    pub summarized_entries: usize,
}

/// Owns one session's history and its cached summary
pub struct ContextManager {
    config: ContextConfig,
    estimator: Arc<dyn TokenEstimator>,
    entries: Vec<WorkflowEntry>,
    system_prompt: String,
    user_goal: String,
    cached_summary: Option<CachedSummary>,
    /// Last position in the older-entries list folded into the cache
    last_summarized_index: Option<usize>,
    /// Position in `entries` of the goal currently pursued
    goal_index: usize,
    next_id: u64,
}

impl ContextManager {
    /// Create a manager using the character-ratio estimator
    pub fn new(config: ContextConfig) -> Self {
        let estimator = Arc::new(CharRatioEstimator::new(config.chars_per_token));
        Self::with_estimator(config, estimator)
    }

    /// Create a manager with a custom token estimator
    pub fn with_estimator(config: ContextConfig, estimator: Arc<dyn TokenEstimator>) -> Self {
        Self {
            config,
            estimator,
            entries: Vec::new(),
            system_prompt: String::new(),
            user_goal: String::new(),
            cached_summary: None,
            last_summarized_index: None,
            goal_index: 1,
            next_id: 0,
        }
    }

    /// Reset all state and start a session
    pub fn initialize(&mut self, system_prompt: impl Into<String>, user_goal: impl Into<String>) {
        self.clear();
        self.system_prompt = system_prompt.into();
        self.user_goal = user_goal.into();

        let system_prompt = self.system_prompt.clone();
        let user_goal = self.user_goal.clone();
        self.add_entry(
            Role::System,
            system_prompt,
            EntryCategory::SystemPrompt,
            EntryMetadata::default(),
        );
        self.add_entry(
            Role::User,
            user_goal,
            EntryCategory::UserGoal,
            EntryMetadata::default(),
        );
    }

    /// Chain a new goal onto the existing history without re-initializing
    pub fn add_continuation(&mut self, goal: impl Into<String>, prior_context: Option<&str>) {
        let goal = goal.into();
        let note = match prior_context {
            Some(prior) if !prior.trim().is_empty() => {
                format!("[Continuing from previous phase]\n{}", prior)
            }
            _ => "[Continuing from previous phase]".to_string(),
        };
        self.add_context_note(note);

        // The superseded goal was kept out of the summary; fold it in again
        let previous = self.goal_index;
        if previous >= 2 {
            if let Some(last) = self.last_summarized_index {
                if previous - 2 <= last {
                    debug!("Goal changed inside the summarized range; rebuilding summary");
                    self.cached_summary = None;
                    self.last_summarized_index = None;
                }
            }
        }

        self.user_goal = goal.clone();
        self.goal_index = self.entries.len();
        self.add_entry(
            Role::User,
            goal,
            EntryCategory::UserGoal,
            EntryMetadata::default(),
        );
    }

    /// Append an entry to the log
    pub fn add_entry(
        &mut self,
        role: Role,
        content: impl Into<String>,
        category: EntryCategory,
        metadata: EntryMetadata,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries
            .push(WorkflowEntry::new(id, role, content, category, metadata));
        id
    }

    /// Append an LLM response
    pub fn add_llm_response(&mut self, content: impl Into<String>, iteration: usize) -> u64 {
        self.add_entry(
            Role::Assistant,
            content,
            EntryCategory::LlmResponse,
            EntryMetadata::iteration(iteration),
        )
    }

    /// Append a tool result, fed back to the model as a user turn
    pub fn add_tool_result(
        &mut self,
        tool_id: &str,
        tool_name: &str,
        content: impl Into<String>,
        iteration: usize,
    ) -> u64 {
        self.add_entry(
            Role::User,
            content,
            EntryCategory::ToolResult,
            EntryMetadata::tool(tool_id, tool_name, iteration),
        )
    }

    /// Append a synthetic note (nudges, continuation markers)
    pub fn add_context_note(&mut self, content: impl Into<String>) -> u64 {
        self.add_entry(
            Role::User,
            content,
            EntryCategory::ContextNote,
            EntryMetadata::default(),
        )
    }

    /// Discard the whole log and any cached summary
    pub fn clear(&mut self) {
        self.entries.clear();
        self.system_prompt.clear();
        self.user_goal.clear();
        self.cached_summary = None;
        self.last_summarized_index = None;
        self.goal_index = 1;
    }

    pub fn entries(&self) -> &[WorkflowEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the system prompt and goal entries are in place
    pub fn is_initialized(&self) -> bool {
        self.entries.len() >= 2
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn user_goal(&self) -> &str {
        &self.user_goal
    }

    pub fn cached_summary(&self) -> Option<&CachedSummary> {
        self.cached_summary.as_ref()
    }

    pub fn last_summarized_index(&self) -> Option<usize> {
        self.last_summarized_index
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Estimated tokens of the full, unsummarized history
    pub fn estimate_total_tokens(&self) -> usize {
        self.entries
            .iter()
            .map(|e| self.estimator.estimate_message(e.role(), e.content()))
            .sum()
    }

    pub fn stats(&self) -> ContextStats {
        ContextStats {
            entries: self.entries.len(),
            estimated_tokens: self.estimate_total_tokens(),
            token_budget: self.config.token_budget,
            summarized_entries: self
                .cached_summary
                .as_ref()
                .map(|c| c.covered_entries)
                .unwrap_or(0),
        }
    }

    /// Produce a message sequence that fits the token budget
    ///
    /// Short histories are returned verbatim. Longer ones keep the system
    /// prompt, the user goal, the current chained goal and the last `2 * W`
    /// entries verbatim and fold everything in between into a single summary
    /// message.
    pub async fn build_context(
        &mut self,
        step_label: &str,
        summarizer: &dyn Summarizer,
        on_progress: Option<ContextProgress<'_>>,
    ) -> Result<ContextBuildResult> {
        let budget = self.config.token_budget;
        let total = self.estimate_total_tokens();

        if total <= budget || !self.is_initialized() {
            return Ok(ContextBuildResult {
                messages: self.entries.iter().map(WorkflowEntry::to_message).collect(),
                token_estimate: total,
                summarized: false,
                folds: 0,
                cache_hit: false,
                over_budget: total > budget,
            });
        }

        let rest = &self.entries[2..];
        let recent_len = rest.len().min(self.config.recency_window * 2);
        let split = rest.len() - recent_len;
        let older: Vec<&WorkflowEntry> = rest[..split].iter().collect();
        let recent = &rest[split..];

        // A chained goal that slid out of the recency window stays verbatim
        let pinned_goal = (self.goal_index >= 2 && self.goal_index - 2 < split)
            .then(|| &self.entries[self.goal_index]);
        let pinned_id = pinned_goal.map(WorkflowEntry::id);
        let summarizable = older.len() - usize::from(pinned_goal.is_some());

        let mut messages = vec![self.entries[0].to_message(), self.entries[1].to_message()];
        if let Some(goal) = pinned_goal {
            messages.push(goal.to_message());
        }

        if summarizable == 0 {
            messages.extend(recent.iter().map(WorkflowEntry::to_message));
            let token_estimate = self.estimator.estimate_messages(&messages);
            warn!(
                "Recency window alone exceeds budget ({} > {} tokens); sending verbatim",
                token_estimate, budget
            );
            return Ok(ContextBuildResult {
                messages,
                token_estimate,
                summarized: false,
                folds: 0,
                cache_hit: false,
                over_budget: token_estimate > budget,
            });
        }

        let mut covered = match (&self.cached_summary, self.last_summarized_index) {
            (Some(_), Some(index)) => index + 1,
            _ => 0,
        };
        if covered > older.len() {
            warn!("Cached summary covers more entries than exist; rebuilding");
            self.cached_summary = None;
            self.last_summarized_index = None;
            covered = 0;
        }

        let mut folds = 0;
        let cache_hit = covered == older.len();
        let summary_text = if cache_hit {
            debug!("Context cache hit ({} entries already summarized)", covered);
            if let Some(report) = on_progress {
                report("Reusing cached context summary");
            }
            self.cached_summary
                .as_ref()
                .map(|c| c.text.clone())
                .unwrap_or_default()
        } else {
            let to_fold: Vec<&WorkflowEntry> = older[covered..]
                .iter()
                .copied()
                .filter(|e| Some(e.id()) != pinned_id)
                .collect();
            let pages = paginate(self.estimator.as_ref(), &to_fold, self.config.page_budget);
            info!(
                "Summarizing {} older entries in {} page(s) (total {} tokens > budget {})",
                to_fold.len(),
                pages.len(),
                total,
                budget
            );

            let mut rolling = self.cached_summary.as_ref().map(|c| c.text.clone());
            for (index, page) in pages.iter().enumerate() {
                if let Some(report) = on_progress {
                    report(&format!(
                        "Summarizing context page {}/{} ({} entries)",
                        index + 1,
                        pages.len(),
                        page.len()
                    ));
                }

                let prompt = match &rolling {
                    None => first_page_prompt(&self.user_goal, step_label, page),
                    Some(previous) => fold_prompt(&self.user_goal, step_label, previous, page),
                };

                let text = summarizer.summarize(&prompt).await.map_err(|e| match e {
                    FoldwiseError::Summarizer(_) => e,
                    other => FoldwiseError::summarizer(other.to_string()),
                })?;
                folds += 1;
                rolling = Some(text);
            }
            rolling.unwrap_or_default()
        };

        messages.push(Message::user(format!(
            "[Context summary of {} earlier entries]\n\n{}",
            summarizable,
            summary_text
        )));
        messages.extend(recent.iter().map(WorkflowEntry::to_message));

        let token_estimate = self.estimator.estimate_messages(&messages);
        let over_budget = token_estimate > budget;
        if over_budget {
            warn!(
                "Assembled context still exceeds budget ({} > {} tokens)",
                token_estimate, budget
            );
        }

        let covered_entries = older.len();
        if !cache_hit {
            self.cached_summary = Some(CachedSummary {
                token_estimate: self.estimator.estimate(&summary_text),
                text: summary_text,
                covered_entries,
                created_at: Utc::now(),
            });
            self.last_summarized_index = Some(covered_entries - 1);
        }

        Ok(ContextBuildResult {
            messages,
            token_estimate,
            summarized: true,
            folds,
            cache_hit,
            over_budget,
        })
    }
}

/// Greedily bucket entries into pages of at most `page_budget` tokens
///
/// An entry larger than the budget gets a page of its own.
fn paginate<'a>(
    estimator: &dyn TokenEstimator,
    entries: &[&'a WorkflowEntry],
    page_budget: usize,
) -> Vec<Vec<&'a WorkflowEntry>> {
    let mut pages = Vec::new();
    let mut current: Vec<&'a WorkflowEntry> = Vec::new();
    let mut current_tokens = 0;

    for entry in entries {
        let tokens = estimator.estimate_message(entry.role(), entry.content());
        if !current.is_empty() && current_tokens + tokens > page_budget {
            pages.push(std::mem::take(&mut current));
            current_tokens = 0;
        }
        current.push(*entry);
        current_tokens += tokens;
    }

    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records prompts and echoes the fold order as `prev>markers`
    struct RecordingSummarizer {
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingSummarizer {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        async fn summarize(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());

            let previous = prompt
                .split("=== EXISTING SUMMARY ===\n")
                .nth(1)
                .and_then(|rest| rest.split("\n\n=== NEWER HISTORY ===").next())
                .unwrap_or("");
            let history = prompt
                .split("HISTORY ===\n")
                .nth(1)
                .and_then(|rest| rest.split("=== END").next())
                .unwrap_or("");
            let markers: Vec<&str> = history
                .split_whitespace()
                .filter(|w| w.starts_with("mark-"))
                .collect();

            if previous.is_empty() {
                Ok(markers.join(","))
            } else {
                Ok(format!("{}>{}", previous, markers.join(",")))
            }
        }
    }

    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _prompt: &str) -> Result<String> {
            Err(FoldwiseError::llm("connection refused"))
        }
    }

    fn config(token_budget: usize, page_budget: usize, recency_window: usize) -> ContextConfig {
        ContextConfig {
            token_budget,
            page_budget,
            recency_window,
            chars_per_token: 4.0,
        }
    }

    /// Content estimating to roughly `tokens` tokens, tagged with a marker
    fn sized(marker: &str, tokens: usize) -> String {
        format!("{} {}", marker, "x".repeat(tokens * 4))
    }

    #[test]
    fn under_budget_returns_history_verbatim() {
        let mut manager = ContextManager::new(config(10_000, 1_000, 2));
        manager.initialize("system", "goal");
        manager.add_llm_response("thinking", 1);
        manager.add_tool_result("read_file", "Read File", "contents", 1);

        let summarizer = RecordingSummarizer::new();
        let result =
            tokio_test::block_on(manager.build_context("step", &summarizer, None)).unwrap();

        assert!(!result.summarized);
        assert!(!result.over_budget);
        assert_eq!(result.folds, 0);
        assert_eq!(summarizer.calls(), 0);
        let contents: Vec<&str> = result.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["system", "goal", "thinking", "contents"]);
        assert_eq!(result.token_estimate, manager.estimate_total_tokens());
    }

    #[test]
    fn worked_example_folds_two_pages() {
        let mut manager = ContextManager::new(config(20_000, 8_000, 4));
        manager.initialize(sized("sys", 500), sized("goal", 50));
        for i in 0..10 {
            manager.add_tool_result("run", "Run", sized(&format!("mark-{}", i), 5_000), 1);
        }

        let summarizer = RecordingSummarizer::new();
        let result =
            tokio_test::block_on(manager.build_context("iteration 2", &summarizer, None))
                .unwrap();

        assert!(result.summarized);
        assert_eq!(result.folds, 2);
        assert_eq!(summarizer.calls(), 2);
        assert_eq!(result.messages.len(), 3 + 8);
        assert_eq!(result.messages[0].role, Role::System);
        assert!(result.messages[1].content.starts_with("goal"));
        assert!(result.messages[2].content.contains("mark-0>mark-1"));
        assert_eq!(manager.last_summarized_index(), Some(1));
        assert_eq!(manager.cached_summary().unwrap().covered_entries, 2);
    }

    #[test]
    fn recency_window_is_verbatim() {
        let mut manager = ContextManager::new(config(1_000, 400, 2));
        manager.initialize("system", "goal");
        for i in 0..8 {
            manager.add_tool_result("run", "Run", sized(&format!("mark-{}", i), 300), 1);
        }

        let summarizer = RecordingSummarizer::new();
        let result =
            tokio_test::block_on(manager.build_context("", &summarizer, None)).unwrap();

        let tail: Vec<&str> = manager.entries()[manager.len() - 4..]
            .iter()
            .map(|e| e.content())
            .collect();
        let sent: Vec<&str> = result.messages[3..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(sent, tail);
        assert_eq!(result.messages[0].content, "system");
        assert_eq!(result.messages[1].content, "goal");
    }

    #[test]
    fn second_build_hits_cache() {
        let mut manager = ContextManager::new(config(1_000, 400, 1));
        manager.initialize("system", "goal");
        for i in 0..6 {
            manager.add_tool_result("run", "Run", sized(&format!("mark-{}", i), 300), 1);
        }

        let summarizer = RecordingSummarizer::new();
        let first = tokio_test::block_on(manager.build_context("", &summarizer, None)).unwrap();
        let calls = summarizer.calls();
        let second = tokio_test::block_on(manager.build_context("", &summarizer, None)).unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert!(second.summarized);
        assert_eq!(second.folds, 0);
        assert_eq!(summarizer.calls(), calls);
        assert_eq!(first.messages[2].content, second.messages[2].content);
    }

    #[test]
    fn new_entries_extend_cached_summary() {
        let mut manager = ContextManager::new(config(1_000, 400, 1));
        manager.initialize("system", "goal");
        for i in 0..4 {
            manager.add_tool_result("run", "Run", sized(&format!("mark-{}", i), 300), 1);
        }

        let summarizer = RecordingSummarizer::new();
        tokio_test::block_on(manager.build_context("", &summarizer, None)).unwrap();
        assert_eq!(summarizer.calls(), 2);
        assert_eq!(manager.cached_summary().unwrap().text, "mark-0>mark-1");

        manager.add_tool_result("run", "Run", sized("mark-4", 300), 2);
        let result = tokio_test::block_on(manager.build_context("", &summarizer, None)).unwrap();

        assert_eq!(result.folds, 1);
        assert_eq!(summarizer.calls(), 3);
        assert_eq!(manager.cached_summary().unwrap().text, "mark-0>mark-1>mark-2");
        assert_eq!(manager.last_summarized_index(), Some(2));
    }

    #[test]
    fn fold_order_follows_chronology() {
        let run = |order: &[&str]| {
            let mut manager = ContextManager::new(config(1_000, 400, 1));
            manager.initialize("system", "goal");
            for marker in order {
                manager.add_tool_result("run", "Run", sized(marker, 300), 1);
            }
            manager.add_tool_result("run", "Run", sized("tail-a", 300), 1);
            manager.add_tool_result("run", "Run", sized("tail-b", 300), 1);

            let summarizer = RecordingSummarizer::new();
            tokio_test::block_on(manager.build_context("", &summarizer, None)).unwrap();
            let prompts = summarizer.prompts.lock().unwrap().clone();
            (manager.cached_summary().unwrap().text.clone(), prompts)
        };

        let (forward, prompts) = run(&["mark-a", "mark-b", "mark-c"]);
        let (reversed, _) = run(&["mark-c", "mark-b", "mark-a"]);

        assert_eq!(forward, "mark-a>mark-b>mark-c");
        assert_ne!(forward, reversed);
        assert!(prompts[0].contains("mark-a") && !prompts[0].contains("mark-b"));
        assert!(prompts[2].contains("mark-a>mark-b"));
    }

    #[test]
    fn oversized_entry_gets_its_own_page() {
        let estimator = CharRatioEstimator::default();
        let small = WorkflowEntry::new(
            0,
            Role::User,
            "x".repeat(40),
            EntryCategory::ToolResult,
            EntryMetadata::default(),
        );
        let huge = WorkflowEntry::new(
            1,
            Role::User,
            "x".repeat(4_000),
            EntryCategory::ToolResult,
            EntryMetadata::default(),
        );
        let entries = vec![&small, &huge, &small];

        let pages = paginate(&estimator, &entries, 100);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].len(), 1);
        assert_eq!(pages[1][0].id(), 1);
    }

    #[test]
    fn small_entries_share_pages() {
        let estimator = CharRatioEstimator::default();
        let small = WorkflowEntry::new(
            0,
            Role::User,
            "x".repeat(40),
            EntryCategory::ToolResult,
            EntryMetadata::default(),
        );
        let entries = vec![&small; 5];

        // 14 tokens each with overhead: two per 30-token page
        let pages = paginate(&estimator, &entries, 30);
        assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 1]);
    }

    #[test]
    fn recency_window_over_budget_is_flagged() {
        let mut manager = ContextManager::new(config(500, 400, 10));
        manager.initialize("system", "goal");
        for i in 0..4 {
            manager.add_tool_result("run", "Run", sized(&format!("mark-{}", i), 300), 1);
        }

        let summarizer = RecordingSummarizer::new();
        let result =
            tokio_test::block_on(manager.build_context("", &summarizer, None)).unwrap();

        assert!(!result.summarized);
        assert!(result.over_budget);
        assert_eq!(result.messages.len(), 6);
        assert_eq!(summarizer.calls(), 0);
    }

    #[test]
    fn summarizer_failure_propagates_and_leaves_cache_empty() {
        let mut manager = ContextManager::new(config(1_000, 400, 1));
        manager.initialize("system", "goal");
        for i in 0..4 {
            manager.add_tool_result("run", "Run", sized(&format!("mark-{}", i), 300), 1);
        }

        let err = tokio_test::block_on(manager.build_context("", &FailingSummarizer, None))
            .unwrap_err();
        assert!(matches!(err, FoldwiseError::Summarizer(_)));
        assert!(manager.cached_summary().is_none());
    }

    #[test]
    fn progress_callback_reports_pages() {
        let mut manager = ContextManager::new(config(1_000, 400, 1));
        manager.initialize("system", "goal");
        for i in 0..4 {
            manager.add_tool_result("run", "Run", sized(&format!("mark-{}", i), 300), 1);
        }

        let seen = Mutex::new(Vec::new());
        let report = |msg: &str| seen.lock().unwrap().push(msg.to_string());
        let summarizer = RecordingSummarizer::new();
        tokio_test::block_on(manager.build_context("", &summarizer, Some(&report))).unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("page 1/2"));
    }

    #[test]
    fn chained_goal_stays_verbatim_after_leaving_recency_window() {
        let mut manager = ContextManager::new(config(1_000, 400, 1));
        manager.initialize("system", "OLD-GOAL");
        manager.add_llm_response(sized("mark-plan", 300), 1);
        manager.add_continuation("NEW-GOAL", None);
        for i in 0..4 {
            manager.add_tool_result("t", "T", sized(&format!("mark-r{}", i), 300), 2);
        }

        let summarizer = RecordingSummarizer::new();
        let result =
            tokio_test::block_on(manager.build_context("", &summarizer, None)).unwrap();

        let contents: Vec<&str> = result.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(manager.user_goal(), "NEW-GOAL");
        assert_eq!(&contents[..3], &["system", "OLD-GOAL", "NEW-GOAL"]);
        assert!(contents[3].starts_with("[Context summary of 4 earlier entries]"));
        assert!(contents[4].starts_with("mark-r2"));
        assert!(contents[5].starts_with("mark-r3"));
        assert!(summarizer
            .prompts
            .lock()
            .unwrap()
            .iter()
            .all(|p| !p.contains("]\nNEW-GOAL")));

        // A further goal replaces the pinned one and forces a rebuild
        manager.add_continuation("THIRD-GOAL", None);
        manager.add_tool_result("t", "T", sized("mark-r4", 300), 3);
        manager.add_tool_result("t", "T", sized("mark-r5", 300), 3);
        let calls_before = summarizer.calls();
        let result =
            tokio_test::block_on(manager.build_context("", &summarizer, None)).unwrap();

        let contents: Vec<&str> = result.messages.iter().map(|m| m.content.as_str()).collect();
        assert!(!result.cache_hit);
        assert!(summarizer.calls() > calls_before);
        assert_eq!(&contents[..3], &["system", "OLD-GOAL", "THIRD-GOAL"]);
        assert!(!contents.contains(&"NEW-GOAL"));
        assert!(contents[3].starts_with("[Context summary of 8 earlier entries]"));
    }

    #[test]
    fn clear_and_continuation() {
        let mut manager = ContextManager::new(config(1_000, 400, 1));
        manager.initialize("system", "plan the work");
        manager.add_llm_response("plan: write main.rs", 1);
        manager.add_continuation("execute the plan", Some("plan: write main.rs"));

        assert_eq!(manager.len(), 5);
        assert_eq!(manager.user_goal(), "execute the plan");
        assert_eq!(manager.entries()[1].content(), "plan the work");
        assert_eq!(manager.entries()[3].category(), EntryCategory::ContextNote);
        assert!(manager.entries()[3].content().contains("plan: write main.rs"));

        manager.clear();
        assert!(manager.is_empty());
        assert!(!manager.is_initialized());
        assert_eq!(manager.stats().summarized_entries, 0);
    }
}
