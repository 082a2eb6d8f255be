//! Tools module - the tool execution seam of the agent loop
//!
//! Contains the executor contract, the tool registry, and workspace file tools.

pub mod registry;
pub mod workspace;

pub use registry::{
    humanize_tool_id, Tool, ToolDescriptor, ToolExecutor, ToolInputs, ToolOutput, ToolRegistry,
};
pub use workspace::Workspace;
