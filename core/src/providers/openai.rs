use crate::error::CompletionError;
use crate::providers::inline;
use crate::traits::{ChatMessage, ChatRequest, Completion, Provider, ToolCall, ToolSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCallRequest<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OpenAIToolCallRequest<'a> {
    id: &'a str,
    r#type: &'a str,
    function: OpenAIFunctionRequest<'a>,
}

#[derive(Debug, Serialize)]
struct OpenAIFunctionRequest<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAITool<'a> {
    r#type: &'a str,
    function: &'a ToolSpec,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    #[serde(default)]
    id: Option<String>,
    function: OpenAIFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAIFunction {
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

/// Adapter for any endpoint speaking the OpenAI chat completions API.
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    temperature: Option<f64>,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        let api_key = api_key.into();
        Ok(Self {
            client: build_client(Duration::from_secs(120))?,
            api_key: (!api_key.is_empty()).then_some(api_key),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: None,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, reqwest::Error> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn convert_messages<'a>(&self, messages: &'a [ChatMessage]) -> Vec<OpenAIMessage<'a>> {
        messages
            .iter()
            .map(|m| {
                let tool_calls = m.tool_calls.as_ref().map(|tool_calls| {
                    tool_calls
                        .iter()
                        .map(|tc| OpenAIToolCallRequest {
                            id: &tc.id,
                            r#type: "function",
                            function: OpenAIFunctionRequest {
                                name: &tc.name,
                                arguments: &tc.arguments,
                            },
                        })
                        .collect()
                });

                let content = if m.content.is_empty() && tool_calls.is_some() {
                    None
                } else {
                    Some(m.content.as_str())
                };

                OpenAIMessage {
                    role: m.role.as_str(),
                    content,
                    tool_calls,
                    tool_call_id: m.tool_call_id.as_deref(),
                }
            })
            .collect()
    }

    fn convert_tools<'a>(&self, tools: &'a [ToolSpec]) -> Vec<OpenAITool<'a>> {
        tools
            .iter()
            .map(|t| OpenAITool {
                r#type: "function",
                function: t,
            })
            .collect()
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(30))
        .build()
}

/// Normalizes one decoded response into a [`Completion`].
fn into_completion(response: OpenAIResponse) -> Result<Completion, CompletionError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::Malformed("no choices in response".to_string()))?;

    let mut tool_calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, c)| ToolCall {
            id: c
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("call_{}", i)),
            name: c.function.name,
            arguments: c
                .function
                .arguments
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| "{}".to_string()),
        })
        .collect();

    let mut text = choice.message.content.unwrap_or_default();

    if tool_calls.is_empty() && inline::contains_inline_tool_calls(&text) {
        let (prose, calls) = inline::parse_inline_tool_calls(&text);
        if !calls.is_empty() {
            tracing::debug!(count = calls.len(), "Recovered inline tool calls from text");
            text = prose;
            tool_calls = calls;
        }
    }

    if !tool_calls.is_empty() {
        Ok(Completion::ToolCalls {
            text,
            calls: tool_calls,
        })
    } else if !text.trim().is_empty() {
        Ok(Completion::FinalAnswer(text))
    } else {
        Err(CompletionError::Empty)
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<Completion, CompletionError> {
        let openai_request = OpenAIRequest {
            model: &self.model,
            messages: self.convert_messages(request.messages),
            tools: request
                .tools
                .filter(|t| !t.is_empty())
                .map(|t| self.convert_tools(t)),
            temperature: self.temperature,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&openai_request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited { body });
        }
        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: OpenAIResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        into_completion(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Signature, describe};
    use serde_json::{Value, json};

    fn decode(body: Value) -> Result<Completion, CompletionError> {
        into_completion(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn plain_text_is_final_answer() {
        let completion = decode(json!({
            "choices": [{ "message": { "content": "Hello!" } }]
        }))
        .unwrap();
        assert_eq!(completion, Completion::answer("Hello!"));
    }

    #[test]
    fn native_tool_calls_keep_order_and_ids() {
        let completion = decode(json!({
            "choices": [{ "message": {
                "content": null,
                "tool_calls": [
                    { "id": "a", "type": "function", "function": { "name": "one", "arguments": "{\"x\":1}" } },
                    { "id": "b", "type": "function", "function": { "name": "two", "arguments": "" } },
                    { "type": "function", "function": { "name": "three" } }
                ]
            }}]
        }))
        .unwrap();

        let Completion::ToolCalls { text, calls } = completion else {
            panic!("expected tool calls");
        };
        assert!(text.is_empty());
        assert_eq!(
            calls,
            vec![
                ToolCall::new("a", "one", "{\"x\":1}"),
                ToolCall::new("b", "two", "{}"),
                ToolCall::new("call_2", "three", "{}"),
            ]
        );
    }

    #[test]
    fn inline_tags_become_tool_calls() {
        let completion = decode(json!({
            "choices": [{ "message": {
                "content": "<tool_call>{\"name\": \"ping\", \"arguments\": {}}</tool_call>"
            }}]
        }))
        .unwrap();
        assert!(completion.has_tool_calls());
    }

    #[test]
    fn empty_and_choiceless_responses_are_errors() {
        assert!(matches!(
            decode(json!({ "choices": [{ "message": { "content": "  " } }] })),
            Err(CompletionError::Empty)
        ));
        assert!(matches!(
            decode(json!({ "choices": [] })),
            Err(CompletionError::Malformed(_))
        ));
    }

    #[test]
    fn request_serializes_tool_call_round_trip() {
        let provider = OpenAIProvider::new("key").unwrap();
        let messages = vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant_with_tool_calls("", vec![ToolCall::new("c1", "ping", "{}")]),
            ChatMessage::tool_result(crate::traits::ToolCallResult::new("c1", "pong")),
        ];
        let spec = describe(&Signature::new("ping")).unwrap().spec();
        let specs = [spec];

        let request = OpenAIRequest {
            model: "m",
            messages: provider.convert_messages(&messages),
            tools: Some(provider.convert_tools(&specs)),
            temperature: None,
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["messages"][1]["content"], Value::Null);
        assert_eq!(value["messages"][1]["tool_calls"][0]["function"]["name"], "ping");
        assert_eq!(value["messages"][2]["role"], "tool");
        assert_eq!(value["messages"][2]["tool_call_id"], "c1");
        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["tools"][0]["function"]["parameters"]["type"], "object");
        assert!(value.get("temperature").is_none());
    }

    #[tokio::test]
    async fn http_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"done"}}]}"#)
            .create_async()
            .await;

        let provider = OpenAIProvider::new("secret").unwrap().with_base_url(server.url());
        let messages = [ChatMessage::user("hi")];
        let completion = provider
            .complete(ChatRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(completion, Completion::answer("done"));
    }

    #[tokio::test]
    async fn http_errors_are_classified() {
        let mut server = mockito::Server::new_async().await;
        let _limited = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;
        let _broken = server
            .mock("POST", "/v2/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        let _garbled = server
            .mock("POST", "/v3/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let messages = [ChatMessage::user("hi")];
        let request = ChatRequest {
            messages: &messages,
            tools: None,
        };

        let provider = OpenAIProvider::new("").unwrap().with_base_url(format!("{}/v1", server.url()));
        assert!(matches!(
            provider.complete(request).await,
            Err(CompletionError::RateLimited { body }) if body == "slow down"
        ));

        let provider = OpenAIProvider::new("").unwrap().with_base_url(format!("{}/v2", server.url()));
        assert!(matches!(
            provider.complete(request).await,
            Err(CompletionError::Status { status: 500, .. })
        ));

        let provider = OpenAIProvider::new("").unwrap().with_base_url(format!("{}/v3", server.url()));
        assert!(matches!(
            provider.complete(request).await,
            Err(CompletionError::Malformed(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn configured_timeout_is_applied() {
        let mut server = mockito::Server::new_async().await;
        let _slow = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body_from_request(|_| {
                std::thread::sleep(Duration::from_millis(500));
                br#"{"choices":[{"message":{"content":"late"}}]}"#.to_vec()
            })
            .create_async()
            .await;

        let provider = OpenAIProvider::new("")
            .unwrap()
            .with_base_url(server.url())
            .with_timeout(Duration::from_millis(50))
            .unwrap();
        let messages = [ChatMessage::user("hi")];
        let outcome = provider
            .complete(ChatRequest {
                messages: &messages,
                tools: None,
            })
            .await;

        assert!(matches!(outcome, Err(CompletionError::Timeout)));
    }
}
