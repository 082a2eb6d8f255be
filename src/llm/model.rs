//! Provider-backed language model
//!
//! Binds a provider to a model name and generation options so it can serve
//! as the agent's `LanguageModel` and as the context `Summarizer`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::context::Summarizer;
use crate::core::{Message, Result};
use crate::llm::traits::{GenerateOptions, LLMProvider, LanguageModel, StreamCallback};

/// A provider plus the model and options to call it with
#[derive(Clone)]
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    model: String,
    options: GenerateOptions,
    on_token: Option<Arc<StreamCallback>>,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            options: GenerateOptions::default(),
            on_token: None,
        }
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    /// Stream tokens to a callback while the response is generated
    pub fn with_streaming(mut self, on_token: Arc<StreamCallback>) -> Self {
        self.on_token = Some(on_token);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for ProviderModel {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let options = Some(self.options.clone());
        let response = match &self.on_token {
            Some(on_token) => {
                self.provider
                    .chat_stream(&self.model, messages, options, on_token.as_ref())
                    .await?
            }
            None => self.provider.chat(&self.model, messages, options).await?,
        };

        if let Some(usage) = &response.usage {
            debug!(
                "{} usage: {} prompt + {} completion tokens",
                response.model, usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(response.content)
    }
}

#[async_trait]
impl Summarizer for ProviderModel {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        let messages = vec![Message::user(prompt)];
        let response = self
            .provider
            .chat(&self.model, &messages, Some(self.options.clone()))
            .await?;
        Ok(response.content)
    }
}
