//! Agent module: core agent logic.
//!
//! This module contains:
//! - Provider-agnostic message types (Message, LlmResponse)
//! - Message history
//! - LLM client trait and the chat completions implementation
//! - Tool execution service
//! - Agent loop tying them together
//!
//! # Adding a New LLM Provider
//!
//! See [`llm::ProviderRegistry`] for instructions.

mod history;
mod loop_impl;
mod message;
mod tool_service;

// LLM providers in submodule
pub mod llm;

// Re-exports for convenience
pub use history::{InMemoryMessageHistory, MessageHistory};
pub use llm::{LlmClient, OpenAiClient, ProviderRegistry};
pub use loop_impl::{AgentLoop, AgentOutcome};
pub use message::{
    FinishReason, LlmResponse, Message, Role, ToolCallRequest, ToolMessage, ToolResultEntry, Usage,
};
pub use tool_service::ToolService;
