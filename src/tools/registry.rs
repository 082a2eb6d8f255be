//! Tool registry - manages and dispatches tool calls
//!
//! The agent loop only knows the [`ToolExecutor`] contract: a tool id and an
//! input map go in, a serializable output or an error comes out.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{FoldwiseError, Result};

/// Input arguments of a tool call
pub type ToolInputs = Map<String, Value>;

/// Successful output of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Serializable payload shown to the agent
    pub output: Value,
    /// Paths of files or artifacts the tool created
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_created: Vec<String>,
}

impl ToolOutput {
    pub fn new(output: impl Into<Value>) -> Self {
        Self {
            output: output.into(),
            files_created: Vec::new(),
        }
    }

    /// Record a created file path
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.files_created.push(path.into());
        self
    }
}

/// Id and description of a tool, used to build the system prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub id: String,
    pub display_name: String,
    pub description: String,
    /// Example input object
    pub example_inputs: Value,
}

/// Executes tools by id
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run one tool call
    async fn execute(&self, tool_id: &str, inputs: &ToolInputs) -> Result<ToolOutput>;

    /// Human-readable tool name
    fn display_name(&self, tool_id: &str) -> String {
        humanize_tool_id(tool_id)
    }

    /// Tools available for the system prompt
    fn describe(&self) -> Vec<ToolDescriptor> {
        Vec::new()
    }
}

/// A single tool implementation
#[async_trait]
pub trait Tool: Send + Sync {
    fn id(&self) -> &str;

    fn display_name(&self) -> &str;

    fn description(&self) -> &str;

    fn example_inputs(&self) -> Value {
        Value::Object(Map::new())
    }

    async fn execute(&self, inputs: &ToolInputs) -> Result<ToolOutput>;
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, for stable prompts
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same id
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let id = tool.id().to_string();
        if self.tools.insert(id.clone(), tool).is_none() {
            self.order.push(id);
        }
    }

    /// Builder-style registration
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(id)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool ids in registration order
    pub fn ids(&self) -> &[String] {
        &self.order
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, tool_id: &str, inputs: &ToolInputs) -> Result<ToolOutput> {
        let tool = self
            .tools
            .get(tool_id)
            .ok_or_else(|| FoldwiseError::UnknownTool(tool_id.to_string()))?;
        tool.execute(inputs).await
    }

    fn display_name(&self, tool_id: &str) -> String {
        self.tools
            .get(tool_id)
            .map(|t| t.display_name().to_string())
            .unwrap_or_else(|| humanize_tool_id(tool_id))
    }

    fn describe(&self) -> Vec<ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|id| self.tools.get(id))
            .map(|tool| ToolDescriptor {
                id: tool.id().to_string(),
                display_name: tool.display_name().to_string(),
                description: tool.description().to_string(),
                example_inputs: tool.example_inputs(),
            })
            .collect()
    }
}

/// `write_file` -> `Write File`
pub fn humanize_tool_id(tool_id: &str) -> String {
    tool_id
        .split(|c: char| c == '_' || c == '-' || c == '.')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fetch a required string input
pub fn required_str<'a>(inputs: &'a ToolInputs, key: &str) -> Result<&'a str> {
    inputs
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| FoldwiseError::tool(format!("missing string input '{}'", key)))
}
