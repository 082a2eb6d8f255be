//! CLI module - command-line interface
//!
//! Contains the REPL, command parsing and session wiring.

pub mod commands;
pub mod repl;
pub mod session;

pub use repl::Repl;
pub use session::{build_orchestrator, check_backend, render_result};
