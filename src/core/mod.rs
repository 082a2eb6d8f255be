//! Core module - shared infrastructure for Foldwise
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the application.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AgentConfig, Config, ContextConfig, TruncationConfig};
pub use error::{FoldwiseError, Result};
pub use types::*;
