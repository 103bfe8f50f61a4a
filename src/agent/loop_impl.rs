//! Agent loop - alternates model calls and tool rounds until the model stops

use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::llm::LlmClient;
use super::message::{FinishReason, LlmResponse, Message, ToolResultEntry, Usage};
use super::tool_service::ToolService;
use crate::error::Error;
use crate::tools::ToolExecutionResult;
use crate::Result;

/// How a run ended, plus what it cost.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// Content of the last reply, possibly partial.
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub model_calls: usize,
    /// Every tool result of the run, in execution order.
    pub tool_results: Vec<ToolExecutionResult>,
    pub usage: Usage,
}

impl AgentOutcome {
    /// True when the model finished normally.
    pub fn is_complete(&self) -> bool {
        self.finish_reason == FinishReason::Stop
    }
}

/// The agent loop processes a prompt through LLM and tool execution
pub struct AgentLoop<C: LlmClient> {
    client: C,
    tools: ToolService,
    max_rounds: usize,
}

impl<C: LlmClient> AgentLoop<C> {
    /// Create a new agent loop
    pub fn new(client: C, tools: ToolService, max_rounds: usize) -> Self {
        Self {
            client,
            tools,
            max_rounds,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run the agent loop for a single prompt.
    ///
    /// Ends on `stop`, or on any finish reason other than `tool_calls`
    /// (reported in the outcome, not as an error). Fails with
    /// [`Error::MaxIterations`] if the model is still calling tools after
    /// `max_rounds` model calls. Tool calls requested by the last permitted
    /// model call are not executed.
    pub async fn run(&mut self, prompt: &str) -> Result<AgentOutcome> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("agent_run", %run_id);
        self.run_rounds(prompt).instrument(span).await
    }

    async fn run_rounds(&mut self, prompt: &str) -> Result<AgentOutcome> {
        info!("Starting agent loop with prompt: {}", prompt);

        let mut message = Message::user(prompt);
        let mut tool_results = Vec::new();
        let mut usage = Usage::default();

        for round in 0..self.max_rounds {
            debug!("Round {}/{}", round + 1, self.max_rounds);

            let response = self.client.send_message(message).await?;
            usage.add(&response.usage);

            match response.finish_reason.clone() {
                FinishReason::Stop => {
                    let chars = response.content.as_deref().map_or(0, str::len);
                    info!("Agent completed with response: {} chars", chars);
                    return Ok(finish(response, round + 1, tool_results, usage));
                }
                FinishReason::ToolCalls if response.has_tool_calls() => {
                    // No model call is left to receive the results.
                    if round + 1 == self.max_rounds {
                        warn!(
                            "Round limit reached; skipping {} tool calls",
                            response.tool_calls.len()
                        );
                        break;
                    }

                    let results = self.tools.process_tool_calls(&response).await;
                    for result in &results {
                        debug!(
                            "Tool {} ({}) success={}",
                            result.tool_name, result.id, result.success
                        );
                    }

                    message = tool_results_message(&results);
                    tool_results.extend(results);
                }
                reason => {
                    warn!("Model stopped with unexpected finish reason: {}", reason);
                    return Ok(finish(response, round + 1, tool_results, usage));
                }
            }
        }

        Err(Error::MaxIterations(self.max_rounds))
    }
}

/// One tool message answering every call of the round.
fn tool_results_message(results: &[ToolExecutionResult]) -> Message {
    Message::tool_results(
        results
            .iter()
            .map(|r| ToolResultEntry {
                tool_call_id: r.id.clone(),
                content: r.content(),
            })
            .collect(),
    )
}

fn finish(
    response: LlmResponse,
    model_calls: usize,
    tool_results: Vec<ToolExecutionResult>,
    usage: Usage,
) -> AgentOutcome {
    AgentOutcome {
        content: response.content,
        finish_reason: response.finish_reason,
        model_calls,
        tool_results,
        usage,
    }
}
