//! Workflow entries - the atomic units of session history
//!
//! Entries are immutable once created; the session log only ever appends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Message, Role};

/// What an entry represents in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryCategory {
    SystemPrompt,
    UserGoal,
    LlmResponse,
    ToolResult,
    ContextNote,
}

impl std::fmt::Display for EntryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryCategory::SystemPrompt => write!(f, "system-prompt"),
            EntryCategory::UserGoal => write!(f, "user-goal"),
            EntryCategory::LlmResponse => write!(f, "llm-response"),
            EntryCategory::ToolResult => write!(f, "tool-result"),
            EntryCategory::ContextNote => write!(f, "context-note"),
        }
    }
}

/// Optional annotations carried by an entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration: Option<usize>,
    /// The entry is itself a digest of other entries
    #[serde(default)]
    pub is_summary: bool,
}

impl EntryMetadata {
    /// Metadata for a tool result entry
    pub fn tool(tool_id: impl Into<String>, tool_name: impl Into<String>, iteration: usize) -> Self {
        Self {
            tool_name: Some(tool_name.into()),
            tool_id: Some(tool_id.into()),
            iteration: Some(iteration),
            is_summary: false,
        }
    }

    /// Metadata carrying only the loop iteration
    pub fn iteration(iteration: usize) -> Self {
        Self {
            iteration: Some(iteration),
            ..Default::default()
        }
    }
}

/// One immutable unit of session history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEntry {
    id: u64,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
    category: EntryCategory,
    metadata: EntryMetadata,
}

impl WorkflowEntry {
    pub(crate) fn new(
        id: u64,
        role: Role,
        content: impl Into<String>,
        category: EntryCategory,
        metadata: EntryMetadata,
    ) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            created_at: Utc::now(),
            category,
            metadata,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn category(&self) -> EntryCategory {
        self.category
    }

    pub fn metadata(&self) -> &EntryMetadata {
        &self.metadata
    }

    /// Role-tagged message view of this entry
    pub fn to_message(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }

    /// Render the entry as a transcript line for the summarizer
    pub fn render_for_summary(&self) -> String {
        let label = match &self.metadata.tool_name {
            Some(tool) => format!("{} ({})", self.category, tool),
            None => self.category.to_string(),
        };
        format!("[{} | {}]\n{}", self.role, label, self.content)
    }
}
