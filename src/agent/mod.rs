//! Agent module - orchestration of the tool-calling loop
//!
//! Contains the loop that turns a goal into tool effects and a final answer,
//! plus the directive parser, progress events and result types it uses.

pub mod directive;
pub mod events;
pub mod loop_state;
pub mod orchestrator;
pub mod prompt;
pub mod result;
pub mod truncation;

pub use directive::{format_directive, parse_directives, DirectiveError, ParsedResponse, ToolDirective};
pub use events::{AgentProgressEvent, LoggingListener, NoopListener, ProgressKind, ProgressListener};
pub use loop_state::{AgentLoopState, AgentPhase, ExecutionOptions};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use result::{ContextUsage, ExecutionResult, ExecutionStatus, ToolCallResult};
pub use truncation::{TruncationPolicy, TruncationStyle};
