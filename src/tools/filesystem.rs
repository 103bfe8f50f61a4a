//! Filesystem tools - read and write files

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use super::{required_str, ParameterType, Tool, ToolParameters};
use crate::error::Error;
use crate::Result;

/// Read file contents
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str { "Read" }
    fn description(&self) -> &str { "Read and return the contents of a file" }

    fn parameters(&self) -> ToolParameters {
        ToolParameters::object()
            .property("filePath", ParameterType::String, "The path to the file to read")
            .required("filePath")
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let path = required_str(&params, "filePath")?;

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Tool(format!("Error reading file {}: {}", path, e)))?;

        Ok(Value::String(content))
    }
}

/// Write content to a file
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str { "Write" }
    fn description(&self) -> &str { "Write content to a file, creating it if it doesn't exist" }

    fn parameters(&self) -> ToolParameters {
        ToolParameters::object()
            .property("filePath", ParameterType::String, "The path to the file to write")
            .property("content", ParameterType::String, "The content to write to the file")
            .required("filePath")
            .required("content")
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let path = required_str(&params, "filePath")?;
        let content = required_str(&params, "content")?;

        // Create parent directories if needed
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Tool(format!("Error writing file {}: {}", path, e)))?;
        }

        tokio::fs::write(path, content)
            .await
            .map_err(|e| Error::Tool(format!("Error writing file {}: {}", path, e)))?;

        Ok(Value::String(format!("Successfully wrote to {}", path)))
    }
}
