//! Progress events emitted by the agent loop
//!
//! Events are fire-and-forget: the orchestrator hands each one to a
//! [`ProgressListener`] and keeps nothing.
//!
//! | Listener | Use case |
//! |----------|----------|
//! | [`NoopListener`] | Tests or silent runs |
//! | [`LoggingListener`] | Forward everything to `tracing` |
//! | any `Fn(&AgentProgressEvent)` | Quick closures, UI updates |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Loop phase or notable occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressKind {
    Initializing,
    Thinking,
    ContextSummarizing,
    ContextOverBudget,
    ApiCall,
    Parsing,
    DirectiveSkipped,
    ExecutingTool,
    ToolSucceeded,
    ToolFailed,
    Nudge,
    IterationLimit,
    Completed,
    Failed,
}

impl ProgressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressKind::Initializing => "initializing",
            ProgressKind::Thinking => "thinking",
            ProgressKind::ContextSummarizing => "context-summarizing",
            ProgressKind::ContextOverBudget => "context-over-budget",
            ProgressKind::ApiCall => "api-call",
            ProgressKind::Parsing => "parsing",
            ProgressKind::DirectiveSkipped => "directive-skipped",
            ProgressKind::ExecutingTool => "executing-tool",
            ProgressKind::ToolSucceeded => "tool-succeeded",
            ProgressKind::ToolFailed => "tool-failed",
            ProgressKind::Nudge => "nudge",
            ProgressKind::IterationLimit => "iteration-limit",
            ProgressKind::Completed => "completed",
            ProgressKind::Failed => "failed",
        }
    }

    /// Whether the event signals something went wrong
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ProgressKind::ContextOverBudget
                | ProgressKind::DirectiveSkipped
                | ProgressKind::ToolFailed
                | ProgressKind::IterationLimit
                | ProgressKind::Failed
        )
    }
}

impl std::fmt::Display for ProgressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observability record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProgressEvent {
    pub kind: ProgressKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AgentProgressEvent {
    pub fn new(kind: ProgressKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Receives progress events
pub trait ProgressListener: Send + Sync {
    fn on_event(&self, event: &AgentProgressEvent);
}

impl<F> ProgressListener for F
where
    F: Fn(&AgentProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: &AgentProgressEvent) {
        self(event)
    }
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ProgressListener for NoopListener {
    fn on_event(&self, _event: &AgentProgressEvent) {}
}

/// Logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

impl ProgressListener for LoggingListener {
    fn on_event(&self, event: &AgentProgressEvent) {
        if event.kind.is_warning() {
            warn!(kind = event.kind.as_str(), "{}", event.message);
        } else {
            info!(kind = event.kind.as_str(), "{}", event.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closures_are_listeners() {
        let seen = Mutex::new(Vec::new());
        let listener = |e: &AgentProgressEvent| seen.lock().unwrap().push(e.kind);

        listener.on_event(&AgentProgressEvent::new(ProgressKind::Thinking, "iteration 1"));
        NoopListener.on_event(&AgentProgressEvent::new(ProgressKind::Thinking, "ignored"));

        assert_eq!(*seen.lock().unwrap(), vec![ProgressKind::Thinking]);
    }

    #[test]
    fn kind_names_match_serde() {
        let json = serde_json::to_string(&ProgressKind::ApiCall).unwrap();
        assert_eq!(json, format!("\"{}\"", ProgressKind::ApiCall));
        assert!(ProgressKind::ToolFailed.is_warning());
        assert!(!ProgressKind::Completed.is_warning());
    }
}
