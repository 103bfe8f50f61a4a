//! Tool execution service - runs one round of model-requested tool calls

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use super::message::{LlmResponse, ToolCallRequest};
use crate::tools::{ToolExecutionResult, ToolRegistry};

/// Runs every tool call of a response concurrently against the registry.
#[derive(Clone)]
pub struct ToolService {
    registry: Arc<ToolRegistry>,
}

impl ToolService {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Execute all tool calls in `response`.
    ///
    /// Results come back in call order no matter which call finishes
    /// first, and every call resolves to a result: a failing or unknown
    /// tool never affects its siblings.
    pub async fn process_tool_calls(&self, response: &LlmResponse) -> Vec<ToolExecutionResult> {
        if response.tool_calls.is_empty() {
            return Vec::new();
        }

        debug!("Executing {} tool calls", response.tool_calls.len());

        join_all(response.tool_calls.iter().map(|call| self.execute_call(call))).await
    }

    async fn execute_call(&self, call: &ToolCallRequest) -> ToolExecutionResult {
        match self
            .registry
            .execute_tool(&call.name, &call.id, call.arguments.clone())
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool call {} could not run: {}", call.id, e);
                ToolExecutionResult::failure(&call.id, &call.name, e.to_string())
            }
        }
    }
}
