//! LLM client abstraction layer.
//!
//! This module provides:
//! - [`LlmClient`] trait for swappable LLM providers
//! - [`ProviderRegistry`] for creating a client from configuration
//! - [`OpenAiClient`], the chat completions implementation
//!
//! # Adding a New Provider
//!
//! A provider that speaks the chat completions protocol only needs a
//! [`ProviderSpec`] entry. Anything else gets its own file implementing
//! `LlmClient`.

mod types;

pub mod openai;

use async_trait::async_trait;

use crate::config::Config;
use crate::tools::ToolDefinition;
use crate::Result;

use super::message::{LlmResponse, Message};

pub use openai::{map_message, map_response, map_tool, OpenAiClient, DEFAULT_MODEL};
pub use types::*;

/// LLM client trait, one implementation per provider API.
///
/// A client owns the conversation for one run: every message sent and
/// every reply received is appended to its history.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Append `message` to the history, send the whole history and
    /// record the reply.
    async fn send_message(&mut self, message: Message) -> Result<LlmResponse>;

    /// Get the model this client talks to.
    fn default_model(&self) -> &str;

    /// Copy of the conversation so far.
    fn messages(&self) -> Vec<Message>;

    /// Forget the conversation.
    fn reset(&mut self);
}

/// Connection settings for a chat completions provider.
#[derive(Debug)]
pub struct ProviderSpec {
    pub name: &'static str,
    pub api_key_env: &'static str,
    pub base_url_env: &'static str,
    pub default_base_url: &'static str,
}

const PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "openrouter",
        api_key_env: "OPENROUTER_API_KEY",
        base_url_env: "OPENROUTER_BASE_URL",
        default_base_url: "https://openrouter.ai/api/v1",
    },
    ProviderSpec {
        name: "openai",
        api_key_env: "OPENAI_API_KEY",
        base_url_env: "OPENAI_BASE_URL",
        default_base_url: "https://api.openai.com/v1",
    },
];

/// Provider registry: creates LLM clients from configuration.
///
/// # Example
///
/// ```ignore
/// let client = ProviderRegistry::create(&config, &registry.definitions())?;
/// ```
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create an LLM client from configuration.
    ///
    /// Supported providers:
    /// - `"openrouter"`: OpenRouter chat completions (default)
    /// - `"openai"`: OpenAI chat completions
    pub fn create(config: &Config, tools: &[ToolDefinition]) -> Result<OpenAiClient> {
        config.validate()?;
        let base_url = config.resolved_base_url()?;

        Ok(OpenAiClient::new(
            &config.api_key,
            &base_url,
            Some(&config.model),
            tools,
        ))
    }

    /// Settings for a provider name.
    pub fn spec(name: &str) -> Option<&'static ProviderSpec> {
        PROVIDERS.iter().find(|p| p.name == name)
    }

    /// List available provider names.
    pub fn available() -> Vec<&'static str> {
        PROVIDERS.iter().map(|p| p.name).collect()
    }
}

/// Fake LLM client for testing.
///
/// Replays scripted responses and records every message it is sent.
#[cfg(test)]
pub struct FakeLlmClient {
    responses: std::collections::VecDeque<LlmResponse>,
    history: Vec<Message>,
    calls: usize,
}

#[cfg(test)]
impl FakeLlmClient {
    /// Create with predefined responses.
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            responses: responses.into(),
            history: Vec::new(),
            calls: 0,
        }
    }

    /// Create with predefined text responses.
    pub fn text(responses: Vec<&str>) -> Self {
        Self::new(responses.into_iter().map(LlmResponse::text).collect())
    }

    /// Number of `send_message` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[cfg(test)]
#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn send_message(&mut self, message: Message) -> Result<LlmResponse> {
        self.calls += 1;
        self.history.push(message);

        let response = self
            .responses
            .pop_front()
            .ok_or_else(|| crate::error::Error::Llm("No more fake responses".to_string()))?;
        self.history.push(response.to_message());
        Ok(response)
    }

    fn default_model(&self) -> &str {
        "fake-model"
    }

    fn messages(&self) -> Vec<Message> {
        self.history.clone()
    }

    fn reset(&mut self) {
        self.history.clear();
    }
}
