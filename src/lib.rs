//! Foldwise - budgeted tool-calling agent
//!
//! A Rust agent loop that keeps an unbounded session inside a fixed token
//! budget by folding older history into a rolling summary, and drives a
//! model through tool-call directives until the goal is done.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Context**: Session history, token estimation and summary folding
//! - **Agent**: The orchestrator loop, directive parsing and results
//! - **LLM**: Language model seam with an Ollama backend
//! - **Tools**: Tool executor seam, registry and workspace file tools
//! - **CLI**: REPL and session wiring
//!
//! # Usage
//!
//! ```rust,no_run
//! use foldwise::agent::ExecutionOptions;
//! use foldwise::cli::build_orchestrator;
//! use foldwise::Config;
//!
//! #[tokio::main]
//! async fn main() -> foldwise::Result<()> {
//!     let config = Config::load();
//!     let mut agent = build_orchestrator(&config)?;
//!
//!     let result = agent
//!         .execute("Write a hello world in Rust to main.rs", ExecutionOptions::default())
//!         .await;
//!     println!("{}", result.final_response);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod context;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{ExecutionOptions, ExecutionResult, Orchestrator};
pub use cli::Repl;
pub use context::ContextManager;
pub use core::{Config, FoldwiseError, Result};
