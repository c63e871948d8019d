//! GenAI-based model client
//!
//! Uses the genai framework so any supported provider can drive the agent
//! loop. Tool schemas are bound once at construction; every call sends the
//! full message list and returns a single assistant message.

use async_trait::async_trait;
use futures::StreamExt;
use genai::chat::{ChatMessage, ChatRequest, ChatStreamEvent, Tool, ToolCall, ToolResponse};
use genai::resolver::{AuthData, AuthResolver};
use genai::{Client, WebConfig};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use super::logging::{LogConfig, log_llm_interaction};
use super::{ModelClient, ProviderType};
use crate::error::{Error, Result};
use crate::orchestration::{Message, ToolCallRequest};
use crate::tools::ToolDefinition;

/// A model client implementation using genai
pub struct GenAIProvider {
    client: Client,
    provider_type: ProviderType,
    model: String,
    tools: Vec<ToolDefinition>,
}

impl GenAIProvider {
    /// Default timeout for LLM API requests (5 minutes)
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    fn default_web_config() -> WebConfig {
        WebConfig::default()
            .with_timeout(Self::DEFAULT_TIMEOUT)
            .with_connect_timeout(Duration::from_secs(30))
    }

    /// Create a client that resolves credentials from the environment
    pub fn new(provider_type: ProviderType, model: Option<&str>) -> Self {
        let client = Client::builder()
            .with_web_config(Self::default_web_config())
            .build();
        Self {
            client,
            provider_type,
            model: model.unwrap_or(provider_type.default_model()).to_string(),
            tools: Vec::new(),
        }
    }

    /// Create a client with a specific API key
    pub fn with_api_key(provider_type: ProviderType, api_key: &str, model: Option<&str>) -> Self {
        let api_key = api_key.to_string();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden| -> std::result::Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(api_key.clone())))
            },
        );

        let client = Client::builder()
            .with_web_config(Self::default_web_config())
            .with_auth_resolver(auth_resolver)
            .build();

        Self {
            client,
            provider_type,
            model: model.unwrap_or(provider_type.default_model()).to_string(),
            tools: Vec::new(),
        }
    }

    /// Bind the tool schemas offered to the model on every call
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Translate the conversation into a genai request
    fn build_request(&self, messages: &[Message]) -> ChatRequest {
        let mut chat_req = ChatRequest::default();

        for (i, msg) in messages.iter().enumerate() {
            chat_req = match msg {
                Message::System { content } if i == 0 => chat_req.with_system(content.as_str()),
                Message::System { content } => chat_req.append_message(ChatMessage::system(content.as_str())),
                Message::Human { content } => chat_req.append_message(ChatMessage::user(content.as_str())),
                Message::Assistant { content, tool_calls } if tool_calls.is_empty() => {
                    chat_req.append_message(ChatMessage::assistant(content.as_str()))
                }
                // Tool calls must travel as a single assistant message
                Message::Assistant { tool_calls, .. } => {
                    let genai_tool_calls: Vec<ToolCall> = tool_calls
                        .iter()
                        .map(|tc| ToolCall {
                            call_id: tc.id.clone(),
                            fn_name: tc.name.clone(),
                            fn_arguments: tc.arguments_value(),
                            thought_signatures: None,
                        })
                        .collect();
                    chat_req.append_message(genai_tool_calls)
                }
                Message::ToolResult { call_id, content, .. } => {
                    chat_req.append_message(ToolResponse::new(call_id.clone(), content.clone()))
                }
            };
        }

        if !self.tools.is_empty() {
            let genai_tools: Vec<Tool> = self
                .tools
                .iter()
                .map(|t| {
                    Tool::new(&t.name)
                        .with_description(&t.description)
                        .with_schema(t.parameters.clone())
                })
                .collect();
            chat_req = chat_req.with_tools(genai_tools);
        }

        chat_req
    }

    async fn complete(&self, messages: &[Message]) -> Result<Message> {
        let chat_req = self.build_request(messages);

        // Streaming avoids read timeouts on long generations
        let stream_response = self
            .client
            .exec_chat_stream(&self.model, chat_req, None)
            .await
            .map_err(|e| Error::Provider(format!("GenAI error: {:?}", e)))?;

        let mut content = String::new();
        let mut tool_calls: Vec<ToolCallRequest> = Vec::new();
        let mut stream = stream_response.stream;

        while let Some(event) = stream.next().await {
            match event {
                Ok(ChatStreamEvent::Chunk(chunk)) => content.push_str(&chunk.content),
                Ok(ChatStreamEvent::ToolCallChunk(tc)) => tool_calls.push(to_request(tc.tool_call)),
                Ok(ChatStreamEvent::End(_)) => break,
                Ok(_) => {}
                Err(e) => return Err(Error::Provider(format!("GenAI stream error: {:?}", e))),
            }
        }

        Ok(Message::assistant_with_tool_calls(content, tool_calls))
    }
}

/// Convert a genai tool call, decoding string-encoded arguments
fn to_request(tool_call: ToolCall) -> ToolCallRequest {
    let arguments = match tool_call.fn_arguments {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        other => other,
    };
    let id = if tool_call.call_id.is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        tool_call.call_id
    };
    ToolCallRequest::new(id, tool_call.fn_name, arguments)
}

#[async_trait]
impl ModelClient for GenAIProvider {
    async fn invoke(&self, messages: &[Message]) -> Result<Message> {
        debug!(model = %self.model, messages = messages.len(), "Calling model");
        let result = self.complete(messages).await;

        let error_text = result.as_ref().err().map(|e| e.to_string());
        log_llm_interaction(LogConfig {
            model: &self.model,
            provider: Some(self.provider_type.as_str()),
            messages,
            tools: Some(&self.tools),
            result: result.as_ref().ok(),
            error: error_text.as_deref(),
        });

        if let Err(e) = &result {
            error!(error = %e, model = %self.model, "LLM request failed");
        }
        result
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_arguments_are_decoded() {
        let request = to_request(ToolCall {
            call_id: "call_1".to_string(),
            fn_name: "weather_check".to_string(),
            fn_arguments: Value::String(r#"{"location":"Cairns","date":"2025-07-01"}"#.to_string()),
            thought_signatures: None,
        });
        assert_eq!(request.id, "call_1");
        assert_eq!(request.arguments["location"], "Cairns");
    }

    #[test]
    fn test_missing_call_id_is_generated() {
        let request = to_request(ToolCall {
            call_id: String::new(),
            fn_name: "hotels_finder".to_string(),
            fn_arguments: json!({"q": "Cairns"}),
            thought_signatures: None,
        });
        assert!(!request.id.is_empty());
        assert_eq!(request.name, "hotels_finder");
    }

    #[test]
    fn test_default_model_and_tools() {
        let provider = GenAIProvider::new(ProviderType::OpenAI, None).with_tools(vec![ToolDefinition {
            name: "weather_check".to_string(),
            description: "weather".to_string(),
            parameters: json!({"type": "object"}),
        }]);
        assert_eq!(ModelClient::model(&provider), "gpt-4o");
        assert_eq!(provider.tools().len(), 1);
    }
}
