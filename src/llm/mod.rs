//! LLM module - Language Model integrations
//!
//! Provides the backend abstraction, an Ollama implementation, and the
//! provider-bound model used by the agent loop and the summarizer.

pub mod model;
pub mod ollama;
pub mod traits;

pub use model::ProviderModel;
pub use ollama::OllamaClient;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, LanguageModel, StreamCallback, TokenUsage};
