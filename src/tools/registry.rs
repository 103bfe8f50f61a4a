//! Tool registry - holds and executes named tools

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::filesystem::{ReadFileTool, WriteFileTool};
use super::shell::BashTool;
use super::{Tool, ToolDefinition, ToolExecutionResult};
use crate::config::Config;
use crate::error::Error;
use crate::Result;

/// Tool registry keeps tools in registration order, keyed by name.
///
/// Built once at startup and shared read-only afterwards.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Create a registry with the built-in tools
    pub fn with_defaults(config: &Config) -> Self {
        let mut registry = Self::new();

        registry.register(ReadFileTool);
        registry.register(WriteFileTool);
        registry.register(BashTool::new(Duration::from_secs(config.tool_timeout_secs)));

        registry
    }

    /// Register a tool, replacing any tool with the same name in place
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        let tool: Arc<dyn Tool> = Arc::new(tool);

        match self.index.get(&name) {
            Some(&slot) => self.tools[slot] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// All tools in registration order
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Get tool definitions for LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool by name.
    ///
    /// Only an unknown name is an error; a failing handler is reported
    /// through `success: false` with its message as the result.
    pub async fn execute_tool(&self, name: &str, id: &str, args: Value) -> Result<ToolExecutionResult> {
        let tool = self
            .index
            .get(name)
            .map(|&slot| &self.tools[slot])
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        debug!("Executing tool {} ({}) with args: {}", name, id, args);

        let (success, result) = match tool.execute(args).await {
            Ok(value) => (true, value),
            Err(e) => (false, Value::String(tool_error_message(e))),
        };

        Ok(ToolExecutionResult {
            id: id.to_string(),
            tool_name: tool.name().to_string(),
            success,
            result,
        })
    }

    /// Check if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// List registered tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler failures carry their own message; strip the variant prefix.
fn tool_error_message(err: Error) -> String {
    match err {
        Error::Tool(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{DummyTool, FailingTool};
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(DummyTool {
            name: "test_tool".to_string(),
            result: json!("success"),
        });

        assert!(registry.has("test_tool"));

        let result = registry
            .execute_tool("test_tool", "call_1", json!({}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.id, "call_1");
        assert_eq!(result.tool_name, "test_tool");
        assert_eq!(result.result, json!("success"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_hard_error() {
        let registry = ToolRegistry::new();
        let result = registry.execute_tool("unknown", "call_1", json!({})).await;
        assert!(matches!(result, Err(Error::ToolNotFound(name)) if name == "unknown"));
    }

    #[tokio::test]
    async fn test_handler_failure_is_captured() {
        let mut registry = ToolRegistry::new();
        registry.register(FailingTool {
            name: "broken".to_string(),
            message: "disk on fire".to_string(),
        });

        let result = registry
            .execute_tool("broken", "call_9", json!({}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.result, json!("disk on fire"));
    }

    #[test]
    fn test_register_overwrites_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(DummyTool {
            name: "a".to_string(),
            result: json!(1),
        });
        registry.register(DummyTool {
            name: "b".to_string(),
            result: json!(2),
        });
        registry.register(FailingTool {
            name: "a".to_string(),
            message: "replaced".to_string(),
        });

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tool_names(), vec!["a", "b"]);
        let order: Vec<_> = registry.tools().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(registry.definitions()[0].description, "Always fails");
    }

    #[test]
    fn test_defaults() {
        let registry = ToolRegistry::with_defaults(&Config::default());
        assert_eq!(registry.tool_names(), vec!["Read", "Write", "Bash"]);
    }
}
