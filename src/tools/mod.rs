//! Tools module - agent capabilities
//!
//! Tools are local actions the model can request, such as reading files
//! or executing shell commands.

mod filesystem;
mod registry;
mod shell;

pub use filesystem::{ReadFileTool, WriteFileTool};
pub use registry::ToolRegistry;
pub use shell::BashTool;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::Result;

/// JSON Schema primitive types accepted in tool parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
    Integer,
    Array,
    Object,
}

/// Schema of a single named parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterProperty {
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

/// Object schema describing a tool's arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub properties: BTreeMap<String, ParameterProperty>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolParameters {
    /// Empty object schema
    pub fn object() -> Self {
        Self {
            kind: ParameterType::Object,
            properties: BTreeMap::new(),
            required: vec![],
        }
    }

    /// Add a named property
    pub fn property(mut self, name: &str, kind: ParameterType, description: &str) -> Self {
        self.properties.insert(
            name.to_string(),
            ParameterProperty {
                kind,
                description: description.to_string(),
                allowed: None,
            },
        );
        self
    }

    /// Add a string property restricted to the given values
    pub fn enumeration(mut self, name: &str, values: &[&str], description: &str) -> Self {
        self.properties.insert(
            name.to_string(),
            ParameterProperty {
                kind: ParameterType::String,
                description: description.to_string(),
                allowed: Some(values.iter().map(|v| v.to_string()).collect()),
            },
        );
        self
    }

    /// Mark a property as required
    pub fn required(mut self, name: &str) -> Self {
        self.required.push(name.to_string());
        self
    }

    pub fn property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }
}

/// Tool definition handed to an LLM client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

/// Outcome of one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionResult {
    /// Id of the originating tool call
    pub id: String,
    pub tool_name: String,
    pub success: bool,
    /// Success payload, or the failure message as a string
    pub result: Value,
}

impl ToolExecutionResult {
    pub fn failure(id: &str, tool_name: &str, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            tool_name: tool_name.to_string(),
            success: false,
            result: Value::String(message.into()),
        }
    }

    /// Result as text for the model: strings verbatim, anything else as JSON.
    pub fn content(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Tool trait - interface for all agent tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in function calls
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// Schema for parameters
    fn parameters(&self) -> ToolParameters;

    /// Execute the tool with given parameters
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Convert to tool definition for LLM
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Fetch a required string argument
pub(crate) fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Tool(format!("Missing '{}' parameter", key)))
}
