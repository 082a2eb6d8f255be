//! Workspace file tools
//!
//! `read_file`, `write_file` and `list_directory`, all confined to one
//! workspace root. Paths are relative; absolute paths and `..` are rejected.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::core::{FoldwiseError, Result};
use crate::tools::registry::{required_str, Tool, ToolInputs, ToolOutput, ToolRegistry};

/// Root directory shared by the file tools
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path inside the workspace
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        let mut resolved = self.root.clone();
        for component in path.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(FoldwiseError::PathOutsideWorkspace(relative.to_string())),
            }
        }
        Ok(resolved)
    }

    /// Registry holding all workspace tools
    pub fn registry(self) -> ToolRegistry {
        let workspace = Arc::new(self);
        ToolRegistry::new()
            .with(Arc::new(ReadFileTool::new(workspace.clone())))
            .with(Arc::new(WriteFileTool::new(workspace.clone())))
            .with(Arc::new(ListDirectoryTool::new(workspace)))
    }
}

/// Read a UTF-8 file
pub struct ReadFileTool {
    workspace: Arc<Workspace>,
}

impl ReadFileTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn id(&self) -> &str {
        "read_file"
    }

    fn display_name(&self) -> &str {
        "Read File"
    }

    fn description(&self) -> &str {
        "Read a text file from the workspace."
    }

    fn example_inputs(&self) -> Value {
        json!({"path": "src/main.rs"})
    }

    async fn execute(&self, inputs: &ToolInputs) -> Result<ToolOutput> {
        let relative = required_str(inputs, "path")?;
        let path = self.workspace.resolve(relative)?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FoldwiseError::tool(format!("cannot read {}: {}", relative, e)))?;
        Ok(ToolOutput::new(content))
    }
}

/// Create or overwrite a file
pub struct WriteFileTool {
    workspace: Arc<Workspace>,
}

impl WriteFileTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn id(&self) -> &str {
        "write_file"
    }

    fn display_name(&self) -> &str {
        "Write File"
    }

    fn description(&self) -> &str {
        "Create or overwrite a file in the workspace. Parent directories are created."
    }

    fn example_inputs(&self) -> Value {
        json!({"path": "notes/plan.md", "content": "# Plan"})
    }

    async fn execute(&self, inputs: &ToolInputs) -> Result<ToolOutput> {
        let relative = required_str(inputs, "path")?;
        let content = required_str(inputs, "content")?;
        let path = self.workspace.resolve(relative)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        debug!("Wrote {} bytes to {}", content.len(), path.display());

        Ok(
            ToolOutput::new(format!("Wrote {} bytes to {}", content.len(), relative))
                .with_file(relative),
        )
    }
}

/// List entries of a directory
pub struct ListDirectoryTool {
    workspace: Arc<Workspace>,
}

impl ListDirectoryTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn id(&self) -> &str {
        "list_directory"
    }

    fn display_name(&self) -> &str {
        "List Directory"
    }

    fn description(&self) -> &str {
        "List files and directories. `path` defaults to the workspace root."
    }

    fn example_inputs(&self) -> Value {
        json!({"path": "src"})
    }

    async fn execute(&self, inputs: &ToolInputs) -> Result<ToolOutput> {
        let relative = inputs.get("path").and_then(Value::as_str).unwrap_or(".");
        let path = self.workspace.resolve(relative)?;

        let mut reader = tokio::fs::read_dir(&path).await?;
        let mut names = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await?.is_dir() {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();

        Ok(ToolOutput::new(json!(names)))
    }
}
