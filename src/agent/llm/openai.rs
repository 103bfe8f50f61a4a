//! OpenAI-compatible chat completions client.
//!
//! Works with OpenRouter, OpenAI and any endpoint that speaks the
//! `/chat/completions` protocol. The client keeps the conversation in
//! generic form and derives the wire history from it on every request.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::agent::history::{InMemoryMessageHistory, MessageHistory};
use crate::agent::message::{
    FinishReason, LlmResponse, Message, ToolCallRequest, ToolMessage, Usage,
};
use crate::error::Error;
use crate::tools::ToolDefinition;
use crate::Result;

use super::types::{
    ChatCompletion, ChatCompletionRequest, ChatFunctionCall, ChatMessage, ChatTool, ChatToolCall,
    FunctionDeclaration, StrictParameters,
};
use super::LlmClient;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "anthropic/claude-haiku-4.5";

/// Chat completions client with its own conversation history.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
    /// `None` when no tools are declared, so the field is left out of requests.
    tools: Option<Vec<ChatTool>>,
    history: InMemoryMessageHistory,
}

impl OpenAiClient {
    /// Create a new client.
    pub fn new(api_key: &str, base_url: &str, model: Option<&str>, tools: &[ToolDefinition]) -> Self {
        let tools = if tools.is_empty() {
            None
        } else {
            Some(tools.iter().map(map_tool).collect())
        };

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            client: Client::new(),
            tools,
            history: InMemoryMessageHistory::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Tool declarations sent with each request.
    pub fn declared_tools(&self) -> Option<&[ChatTool]> {
        self.tools.as_deref()
    }

    /// Generic conversation history.
    pub fn history(&self) -> &InMemoryMessageHistory {
        &self.history
    }

    /// Wire history derived from the generic history.
    pub fn wire_messages(&self) -> Vec<ChatMessage> {
        self.history.iter().flat_map(map_message).collect()
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn send_message(&mut self, message: Message) -> Result<LlmResponse> {
        self.history.add_message(message);

        let response = {
            let request = ChatCompletionRequest {
                model: &self.model,
                messages: self.wire_messages(),
                tools: self.declared_tools(),
            };

            debug!(
                "Sending {} messages to {} ({})",
                request.messages.len(),
                self.endpoint(),
                self.model
            );

            self.client
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await?
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(Error::Llm(format!(
                "Chat completions API error ({status}): {error_text}"
            )));
        }

        let raw: Value = response.json().await?;
        let parsed = map_response(raw)?;

        debug!(
            "Response {} finished with {} ({} tool calls)",
            parsed.id,
            parsed.finish_reason,
            parsed.tool_calls.len()
        );

        self.history.add_message(parsed.to_message());
        Ok(parsed)
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn messages(&self) -> Vec<Message> {
        self.history.messages()
    }

    fn reset(&mut self) {
        self.history.clear();
    }
}

/// Declare a tool in strict mode.
///
/// Strict mode needs a closed schema listing every property as required,
/// whatever the tool itself marks as required.
pub fn map_tool(tool: &ToolDefinition) -> ChatTool {
    ChatTool {
        kind: "function".to_string(),
        function: FunctionDeclaration {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: StrictParameters {
                kind: tool.parameters.kind,
                properties: tool.parameters.properties.clone(),
                additional_properties: false,
                required: tool.parameters.property_names(),
            },
            strict: true,
        },
    }
}

/// Translate one generic message into its wire messages.
///
/// A batched tool message expands to one wire message per result.
pub fn map_message(message: &Message) -> Vec<ChatMessage> {
    match message {
        Message::User { content } => vec![ChatMessage::User {
            content: content.clone().unwrap_or_default(),
        }],
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let tool_calls = if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls.iter().map(map_tool_call).collect())
            };
            vec![ChatMessage::Assistant {
                content: content.clone(),
                tool_calls,
            }]
        }
        Message::Tool(ToolMessage::Batch(results)) => results
            .iter()
            .map(|r| ChatMessage::Tool {
                tool_call_id: r.tool_call_id.clone(),
                content: r.content.clone(),
            })
            .collect(),
        Message::Tool(ToolMessage::Single {
            tool_call_id,
            content,
        }) => vec![ChatMessage::Tool {
            tool_call_id: tool_call_id.clone(),
            content: content.clone().unwrap_or_default(),
        }],
    }
}

fn map_tool_call(call: &ToolCallRequest) -> ChatToolCall {
    ChatToolCall {
        id: call.id.clone(),
        kind: "function".to_string(),
        function: ChatFunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.to_string(),
        },
    }
}

/// Parse a raw completion body into a generic response.
pub fn map_response(raw: Value) -> Result<LlmResponse> {
    // Some compatible providers report failures inside a 200 body.
    if let Some(error) = raw.get("error").filter(|e| !e.is_null()) {
        return Err(Error::Llm(format!("Chat completions API error: {error}")));
    }

    let completion: ChatCompletion = serde_json::from_value(raw.clone())?;
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Llm("No choices in response".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .filter(|tc| tc.kind == "function")
        .filter_map(|tc| tc.function.map(|f| (tc.id, f)))
        .map(|(id, f)| {
            Ok(ToolCallRequest {
                id,
                name: f.name,
                arguments: parse_arguments(&f.arguments)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let finish_reason = match choice.finish_reason.as_deref() {
        Some(reason) => FinishReason::from(reason),
        None if !tool_calls.is_empty() => FinishReason::ToolCalls,
        None => FinishReason::Stop,
    };

    let usage = completion
        .usage
        .map(|u| Usage {
            prompt_tokens: u.prompt_tokens.unwrap_or(0),
            completion_tokens: u.completion_tokens.unwrap_or(0),
            total_tokens: u.total_tokens.unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        id: completion.id,
        content: choice.message.content,
        finish_reason,
        tool_calls,
        usage,
        raw,
    })
}

/// Arguments arrive JSON-encoded; an empty string means no arguments.
fn parse_arguments(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::ToolResultEntry;
    use crate::tools::{ParameterType, ToolParameters};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn wire(message: &Message) -> Value {
        serde_json::to_value(map_message(message)).unwrap()
    }

    fn read_tool() -> ToolDefinition {
        ToolDefinition {
            name: "Read".to_string(),
            description: "Read a file".to_string(),
            parameters: ToolParameters::object()
                .property("filePath", ParameterType::String, "Path to read")
                .property("encoding", ParameterType::String, "Optional encoding")
                .required("filePath"),
        }
    }

    fn completion(message: Value, finish_reason: &str) -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": message,
                "finish_reason": finish_reason
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        })
    }

    #[test]
    fn test_maps_user_message() {
        assert_eq!(
            wire(&Message::user("hello")),
            json!([{"role": "user", "content": "hello"}])
        );
        assert_eq!(
            wire(&Message::User { content: None }),
            json!([{"role": "user", "content": ""}])
        );
    }

    #[test]
    fn test_maps_assistant_without_tool_calls() {
        assert_eq!(
            wire(&Message::assistant("hello back")),
            json!([{"role": "assistant", "content": "hello back"}])
        );
    }

    #[test]
    fn test_maps_assistant_with_tool_calls() {
        let msg = Message::assistant_with_tools(
            None,
            vec![
                ToolCallRequest {
                    id: "call_1".to_string(),
                    name: "my_tool".to_string(),
                    arguments: json!({"arg1": "val1"}),
                },
                ToolCallRequest {
                    id: "call_2".to_string(),
                    name: "other".to_string(),
                    arguments: json!({"n": 2, "nested": {"flag": true}}),
                },
            ],
        );

        let mapped = map_message(&msg);
        assert_eq!(mapped.len(), 1);
        assert_eq!(
            serde_json::to_value(&mapped).unwrap()[0],
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [
                    {
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "my_tool", "arguments": "{\"arg1\":\"val1\"}"}
                    },
                    {
                        "id": "call_2",
                        "type": "function",
                        "function": {"name": "other", "arguments": "{\"n\":2,\"nested\":{\"flag\":true}}"}
                    }
                ]
            })
        );
    }

    #[test]
    fn test_tool_call_arguments_reparse() {
        let arguments = json!({"filePath": "x.txt", "lines": [1, 2, 3]});
        let msg = Message::assistant_with_tools(
            None,
            vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "Read".to_string(),
                arguments: arguments.clone(),
            }],
        );

        let encoded = match &map_message(&msg)[0] {
            ChatMessage::Assistant {
                tool_calls: Some(calls),
                ..
            } => calls[0].function.arguments.clone(),
            other => panic!("unexpected wire message: {other:?}"),
        };

        let response = map_response(completion(
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "Read", "arguments": encoded}
                }]
            }),
            "tool_calls",
        ))
        .unwrap();

        assert_eq!(response.tool_calls[0].arguments, arguments);
    }

    #[test]
    fn test_maps_single_tool_result() {
        assert_eq!(
            wire(&Message::tool_result("call_1", r#"{"result":"ok"}"#)),
            json!([{"role": "tool", "tool_call_id": "call_1", "content": "{\"result\":\"ok\"}"}])
        );

        let empty = Message::Tool(ToolMessage::Single {
            tool_call_id: "call_2".to_string(),
            content: None,
        });
        assert_eq!(
            wire(&empty),
            json!([{"role": "tool", "tool_call_id": "call_2", "content": ""}])
        );
    }

    #[test]
    fn test_maps_batched_tool_results() {
        let msg = Message::tool_results(vec![
            ToolResultEntry {
                tool_call_id: "call_1".to_string(),
                content: r#"{"result":"ok"}"#.to_string(),
            },
            ToolResultEntry {
                tool_call_id: "call_2".to_string(),
                content: r#"{"result":"done"}"#.to_string(),
            },
        ]);

        assert_eq!(
            wire(&msg),
            json!([
                {"role": "tool", "tool_call_id": "call_1", "content": "{\"result\":\"ok\"}"},
                {"role": "tool", "tool_call_id": "call_2", "content": "{\"result\":\"done\"}"}
            ])
        );
    }

    #[test]
    fn test_tool_declaration_is_strict() {
        let declared = serde_json::to_value(map_tool(&read_tool())).unwrap();
        assert_eq!(
            declared,
            json!({
                "type": "function",
                "function": {
                    "name": "Read",
                    "description": "Read a file",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "encoding": {"type": "string", "description": "Optional encoding"},
                            "filePath": {"type": "string", "description": "Path to read"}
                        },
                        "additionalProperties": false,
                        "required": ["encoding", "filePath"]
                    },
                    "strict": true
                }
            })
        );
    }

    #[test]
    fn test_response_filters_non_function_calls() {
        let response = map_response(completion(
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [
                    {"id": "c1", "type": "custom", "custom": {"name": "x", "input": "y"}},
                    {"id": "c2", "type": "function", "function": {"name": "Read", "arguments": "{\"filePath\":\"a\"}"}}
                ]
            }),
            "tool_calls",
        ))
        .unwrap();

        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "c2");
        assert_eq!(response.finish_reason, FinishReason::ToolCalls);
        assert_eq!(response.role(), crate::agent::message::Role::Assistant);
    }

    #[test]
    fn test_response_usage_defaults_to_zero() {
        let raw = json!({
            "id": "x",
            "choices": [{"message": {"content": "hi"}, "finish_reason": "length"}]
        });
        let response = map_response(raw.clone()).unwrap();

        assert_eq!(response.usage, Usage::default());
        assert_eq!(response.finish_reason, FinishReason::Length);
        assert_eq!(response.raw, raw);
    }

    #[test]
    fn test_response_without_choices_fails() {
        let result = map_response(json!({"id": "x", "choices": []}));
        assert!(matches!(result, Err(Error::Llm(_))));
    }

    #[test]
    fn test_error_body_fails() {
        let result = map_response(json!({"error": {"message": "rate limited", "code": 429}}));
        assert!(matches!(result, Err(Error::Llm(msg)) if msg.contains("rate limited")));
    }

    #[test]
    fn test_null_error_field_is_ignored() {
        let response = map_response(json!({
            "id": "r1",
            "error": null,
            "choices": [{
                "message": {"role": "assistant", "content": "fine"},
                "finish_reason": "stop"
            }]
        }))
        .unwrap();
        assert_eq!(response.content.as_deref(), Some("fine"));
    }

    #[test]
    fn test_no_tools_declared() {
        let client = OpenAiClient::new("k", "http://localhost", None, &[]);
        assert!(client.declared_tools().is_none());
        assert_eq!(client.default_model(), DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_send_message_omits_tools_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                json!({"role": "assistant", "content": "4"}),
                "stop",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let base = format!("{}/v1/", server.uri());
        let mut client = OpenAiClient::new("test-key", &base, Some("gpt-4"), &[]);
        let response = client.send_message(Message::user("What is 2+2?")).await.unwrap();

        assert_eq!(response.content.as_deref(), Some("4"));
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.total_tokens, 15);

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["model"], "gpt-4");
        assert!(body.get("tools").is_none());
        assert_eq!(body["messages"], json!([{"role": "user", "content": "What is 2+2?"}]));

        assert_eq!(
            client.messages(),
            vec![Message::user("What is 2+2?"), Message::assistant("4")]
        );
    }

    #[tokio::test]
    async fn test_send_message_resends_full_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                json!({
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "Read", "arguments": "{\"filePath\":\"x.txt\"}"}
                    }]
                }),
                "tool_calls",
            )))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                json!({"role": "assistant", "content": "The file says hi"}),
                "stop",
            )))
            .mount(&server)
            .await;

        let mut client = OpenAiClient::new("k", &server.uri(), None, &[read_tool()]);

        let first = client.send_message(Message::user("Read x.txt")).await.unwrap();
        assert_eq!(first.tool_calls[0].arguments, json!({"filePath": "x.txt"}));

        client
            .send_message(Message::tool_results(vec![
                ToolResultEntry {
                    tool_call_id: "call_1".to_string(),
                    content: "hi".to_string(),
                },
            ]))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);

        let body: Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(body["tools"][0]["function"]["strict"], true);
        assert_eq!(
            body["messages"],
            json!([
                {"role": "user", "content": "Read x.txt"},
                {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "Read", "arguments": "{\"filePath\":\"x.txt\"}"}
                    }]
                },
                {"role": "tool", "tool_call_id": "call_1", "content": "hi"}
            ])
        );

        // Four logical turns, derived into four wire messages.
        assert_eq!(client.history().len(), 4);
        assert_eq!(client.wire_messages().len(), 4);

        client.reset();
        assert!(client.messages().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let mut client = OpenAiClient::new("k", &server.uri(), None, &[]);
        let err = client.send_message(Message::user("hi")).await.unwrap_err();

        assert!(matches!(&err, Error::Llm(msg) if msg.contains("401") && msg.contains("bad key")));
    }
}
