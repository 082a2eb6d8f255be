//! Context module - budgeted session history
//!
//! Holds the append-only entry log for one agent session and turns it into
//! a prompt that fits the configured token budget.

pub mod entry;
pub mod manager;
pub mod summarizer;
pub mod token;

pub use entry::{EntryCategory, EntryMetadata, WorkflowEntry};
pub use manager::{CachedSummary, ContextBuildResult, ContextManager, ContextProgress, ContextStats};
pub use summarizer::Summarizer;
pub use token::{CharRatioEstimator, TokenEstimator};
