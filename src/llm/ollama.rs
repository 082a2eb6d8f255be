//! Ollama client implementation
//!
//! Async HTTP client for the Ollama chat API with streaming support.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

use crate::core::{Config, FoldwiseError, Message, Result};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, StreamCallback, TokenUsage};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    stream: bool,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: OllamaMessage,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama streaming chunk response
#[derive(Debug, Deserialize)]
struct StreamChunkResponse {
    #[serde(default)]
    message: Option<StreamMessage>,
    model: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Message in streaming response
#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[serde(default)]
    content: String,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ollama.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.ollama_url(),
        })
    }

    /// Create a client with custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(300)).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert internal Message to Ollama format
    fn to_ollama_message(msg: &Message) -> OllamaMessage {
        OllamaMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }

    fn to_usage(prompt: Option<u32>, completion: Option<u32>) -> Option<TokenUsage> {
        match (prompt, completion) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        }
    }

    fn build_request<'a>(
        model: &'a str,
        messages: &[Message],
        options: Option<GenerateOptions>,
        stream: bool,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model,
            messages: messages.iter().map(Self::to_ollama_message).collect(),
            options: options.map(|opts| OllamaOptions {
                temperature: opts.temperature,
                num_predict: opts.max_tokens,
                stop: opts.stop,
            }),
            stream,
        }
    }

    /// POST a chat request, mapping connection and status failures
    async fn post_chat(&self, model: &str, request: &ChatRequest<'_>) -> Result<reqwest::Response> {
        trace!("Ollama request: {}", serde_json::to_string(request)?);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("not found") {
                return Err(FoldwiseError::ModelNotFound(model.to_string()));
            }

            return Err(FoldwiseError::llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    fn map_send_error(&self, e: reqwest::Error) -> FoldwiseError {
        if e.is_connect() {
            FoldwiseError::llm_unavailable(format!(
                "Cannot connect to Ollama at {}. Is it running?",
                self.base_url
            ))
        } else {
            FoldwiseError::from(e)
        }
    }
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = Self::build_request(model, messages, options, false);
        let response = self.post_chat(model, &request).await?;

        let response_text = response.text().await?;
        trace!("Ollama response: {}", response_text);

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| FoldwiseError::llm(format!("Failed to parse response: {}", e)))?;

        Ok(LLMResponse {
            usage: Self::to_usage(chat_response.prompt_eval_count, chat_response.eval_count),
            content: chat_response.message.content,
            model: chat_response.model,
        })
    }

    async fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
        on_token: &StreamCallback,
    ) -> Result<LLMResponse> {
        let request = Self::build_request(model, messages, options, true);
        let response = self.post_chat(model, &request).await?;

        let mut full_content = String::new();
        let mut final_model = model.to_string();
        let mut usage = None;

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk_result) = stream.next().await {
            let chunk =
                chunk_result.map_err(|e| FoldwiseError::llm(format!("Stream error: {}", e)))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            // Process complete JSON lines from buffer
            while let Some(newline_pos) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline_pos).collect();
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match serde_json::from_str::<StreamChunkResponse>(line) {
                    Ok(chunk_response) => {
                        final_model = chunk_response.model;
                        if let Some(msg) = chunk_response.message {
                            if !msg.content.is_empty() {
                                on_token(&msg.content);
                                full_content.push_str(&msg.content);
                            }
                        }
                        if chunk_response.done {
                            usage = Self::to_usage(
                                chunk_response.prompt_eval_count,
                                chunk_response.eval_count,
                            );
                        }
                    }
                    Err(e) => debug!("Skipping unparseable stream line: {}: {}", e, line),
                }
            }
        }

        // Process any remaining buffer content
        if let Ok(chunk_response) = serde_json::from_str::<StreamChunkResponse>(buffer.trim()) {
            if let Some(msg) = chunk_response.message {
                if !msg.content.is_empty() {
                    on_token(&msg.content);
                    full_content.push_str(&msg.content);
                }
            }
        }

        Ok(LLMResponse {
            content: full_content,
            usage,
            model: final_model,
        })
    }

    async fn is_model_available(&self, model: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models
            .iter()
            .any(|m| m == model || m.split(':').next() == model.split(':').next()))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(FoldwiseError::llm("Failed to list models"));
        }

        let models_response: ModelsResponse = response.json().await?;
        Ok(models_response.models.into_iter().map(|m| m.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::with_base_url("http://localhost:11434").unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_message_conversion() {
        let msg = Message::system("Be brief");
        let ollama_msg = OllamaClient::to_ollama_message(&msg);
        assert_eq!(ollama_msg.role, "system");
        assert_eq!(ollama_msg.content, "Be brief");
    }

    #[test]
    fn test_request_serialization() {
        let request = OllamaClient::build_request(
            "qwen3:8b",
            &[Message::user("hi")],
            Some(GenerateOptions {
                temperature: Some(0.2),
                ..Default::default()
            }),
            false,
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "qwen3:8b");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["stream"], false);
        assert!(json["options"].get("num_predict").is_none());
    }

    #[test]
    fn test_usage_requires_both_counts() {
        assert!(OllamaClient::to_usage(Some(3), None).is_none());
        assert_eq!(OllamaClient::to_usage(Some(3), Some(4)).unwrap().total_tokens, 7);
    }
}
