//! Configuration management for Foldwise
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/foldwise/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{FoldwiseError, Result};

/// Main configuration for Foldwise
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Model configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Context budgeting
    #[serde(default)]
    pub context: ContextConfig,
    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Streaming configuration
    #[serde(default)]
    pub streaming: StreamingConfig,
    /// Tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model driving the agent loop
    pub name: String,
    /// Model used for fold summarization (falls back to `name`)
    pub summarizer: Option<String>,
    /// Sampling temperature for the agent model
    pub temperature: f32,
}

/// Token budgeting for the context manager
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Soft token budget for an assembled prompt
    pub token_budget: usize,
    /// Maximum estimated tokens per summarization page
    pub page_budget: usize,
    /// Recency window size `W`; the last `2 * W` entries stay verbatim
    pub recency_window: usize,
    /// Characters per token for the heuristic estimator
    pub chars_per_token: f64,
}

/// Agent loop behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum loop iterations before the run is cut off
    /// Default: 10
    pub max_iterations: usize,
    /// Minimum iterations before a tool-free answer is accepted
    /// Default: 0
    pub min_iterations: usize,
    /// Require at least one tool execution before accepting a final answer
    pub require_tool_execution: bool,
    /// Whether to show debug output
    pub debug: bool,
    /// System prompt override
    pub system_prompt: Option<String>,
    /// Size limits applied to tool output before it enters history
    pub truncation: TruncationConfig,
}

/// Tool output size limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TruncationConfig {
    /// Outputs longer than this are truncated
    pub max_result_chars: usize,
    /// Characters kept from the start of a long file read
    pub head_chars: usize,
    /// Characters kept from the end of a long file read
    pub tail_chars: usize,
    /// Characters kept from the start of any other long output
    pub log_prefix_chars: usize,
}

/// Streaming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Whether to stream responses in real-time
    pub enabled: bool,
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Directory the file tools are confined to
    pub workspace_root: PathBuf,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 300,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: env::var("FOLDWISE_MODEL").unwrap_or_else(|_| "qwen3:8b".to_string()),
            summarizer: env::var("FOLDWISE_SUMMARIZER_MODEL").ok(),
            temperature: 0.2,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            token_budget: 24_000,
            page_budget: 8_000,
            recency_window: 4,
            chars_per_token: 4.0,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            min_iterations: 0,
            require_tool_execution: false,
            debug: env::var("FOLDWISE_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            system_prompt: None,
            truncation: TruncationConfig::default(),
        }
    }
}

impl Default for TruncationConfig {
    fn default() -> Self {
        Self {
            max_result_chars: 6_000,
            head_chars: 2_500,
            tail_chars: 2_500,
            log_prefix_chars: 4_000,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: env::var("FOLDWISE_STREAMING")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            workspace_root: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("foldwise")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(FoldwiseError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| FoldwiseError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text, validating the result
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the agent loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_iterations == 0 {
            return Err(FoldwiseError::config("agent.max_iterations must be at least 1"));
        }
        if self.context.page_budget == 0 {
            return Err(FoldwiseError::config("context.page_budget must be positive"));
        }
        if self.context.chars_per_token <= 0.0 {
            return Err(FoldwiseError::config(
                "context.chars_per_token must be positive",
            ));
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| FoldwiseError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| FoldwiseError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| FoldwiseError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Model used for fold summarization
    pub fn summarizer_model(&self) -> &str {
        self.model.summarizer.as_deref().unwrap_or(&self.model.name)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        toml::to_string_pretty(&Config::default())
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
