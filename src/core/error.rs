//! Custom error types for Foldwise
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for Foldwise operations
#[derive(Error, Debug)]
pub enum FoldwiseError {
    /// LLM backend returned an error or an unusable response
    #[error("LLM error: {0}")]
    Llm(String),

    /// No LLM configured, or the backend cannot be reached
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// Summarizer call failed while folding older history
    #[error("Summarizer error: {0}")]
    Summarizer(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Tool id not known to the executor
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model not available
    #[error("Model '{0}' not available in Ollama. Run: ollama pull {0}")]
    ModelNotFound(String),

    /// A tool tried to touch a path outside its workspace
    #[error("Path '{0}' escapes the workspace root")]
    PathOutsideWorkspace(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Foldwise operations
pub type Result<T> = std::result::Result<T, FoldwiseError>;

impl FoldwiseError {
    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create an LLM-unavailable error
    pub fn llm_unavailable(msg: impl Into<String>) -> Self {
        Self::LlmUnavailable(msg.into())
    }

    /// Create a summarizer error
    pub fn summarizer(msg: impl Into<String>) -> Self {
        Self::Summarizer(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
