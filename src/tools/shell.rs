//! Shell tool - execute commands

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use super::{required_str, ParameterType, Tool, ToolParameters};
use crate::error::Error;
use crate::Result;

/// Execute shell commands with a hard timeout
pub struct BashTool {
    timeout: Duration,
}

impl BashTool {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str { "Bash" }
    fn description(&self) -> &str { "Execute a shell command and return its output" }

    fn parameters(&self) -> ToolParameters {
        ToolParameters::object()
            .property("command", ParameterType::String, "The shell command to execute")
            .required("command")
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let command = required_str(&params, "command")?;

        // The child is killed if the timeout drops the future.
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                Error::Tool(format!(
                    "Command failed: timed out after {}s",
                    self.timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| Error::Tool(format!("Command failed: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let detail = if stderr.is_empty() {
                format!("exit code {}", output.status.code().unwrap_or(-1))
            } else {
                stderr.to_string()
            };
            return Err(Error::Tool(format!("Command failed: {}", detail)));
        }

        let text = if stdout.is_empty() { stderr } else { stdout };
        Ok(Value::String(text.to_string()))
    }
}
