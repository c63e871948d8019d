//! Conversation state
//!
//! Messages exchanged between the user, the model and the tools, and the
//! append-only history that holds them for one thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Opaque correlation identifier issued by the model
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Argument map
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    /// Build a request. Non-object arguments are kept under a `"value"` key.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Arguments as a JSON value
    pub fn arguments_value(&self) -> Value {
        Value::Object(self.arguments.clone())
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    Human {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    ToolResult {
        call_id: String,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// Role name as used on the wire
    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "human",
            Self::Assistant { .. } => "assistant",
            Self::ToolResult { .. } => "tool",
        }
    }

    /// Textual content of the message
    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::Human { content }
            | Self::Assistant { content, .. }
            | Self::ToolResult { content, .. } => content,
        }
    }

    /// Tool calls requested by this message (empty unless assistant)
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Self::Assistant { .. })
    }
}

/// The persisted history of one conversation thread
///
/// Append-only. The system prompt is never stored here; it is prepended to
/// every model call instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub thread_id: String,
    messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(thread_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Content of the first human message, i.e. the thread's original request
    pub fn first_human_content(&self) -> Option<&str> {
        self.messages.iter().find_map(|m| match m {
            Message::Human { content } => Some(content.as_str()),
            _ => None,
        })
    }

    /// Append a message, enforcing tool-result correlation
    pub fn push(&mut self, message: Message) -> Result<()> {
        if let Message::ToolResult { call_id, .. } = &message {
            self.check_tool_result(call_id)?;
        }
        self.messages.push(message);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Append several messages in order
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) -> Result<()> {
        for message in messages {
            self.push(message)?;
        }
        Ok(())
    }

    /// Tool calls of the latest assistant message that have no result yet
    ///
    /// Ids need not be unique (some providers reuse the function name as the
    /// id), so each result answers one call, earliest first.
    pub fn pending_tool_calls(&self) -> Vec<&ToolCallRequest> {
        let Some(assistant_idx) = self.messages.iter().rposition(Message::is_assistant) else {
            return Vec::new();
        };
        let mut answered: Vec<&str> = self.messages[assistant_idx + 1..]
            .iter()
            .filter_map(|m| match m {
                Message::ToolResult { call_id, .. } => Some(call_id.as_str()),
                _ => None,
            })
            .collect();
        self.messages[assistant_idx]
            .tool_calls()
            .iter()
            .filter(|tc| match answered.iter().position(|id| *id == tc.id) {
                Some(pos) => {
                    answered.swap_remove(pos);
                    false
                }
                None => true,
            })
            .collect()
    }

    /// A tool result must answer a still-pending call of the immediately
    /// preceding assistant message (only other tool results may sit between).
    fn check_tool_result(&self, call_id: &str) -> Result<()> {
        let preceded_by_assistant = self
            .messages
            .iter()
            .rev()
            .find(|m| !matches!(m, Message::ToolResult { .. }))
            .is_some_and(Message::is_assistant);

        if preceded_by_assistant && self.pending_tool_calls().iter().any(|tc| tc.id == call_id) {
            Ok(())
        } else {
            Err(Error::OrphanToolResult(call_id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(id: &str, name: &str) -> ToolCallRequest {
        ToolCallRequest::new(id, name, json!({"q": "Melbourne"}))
    }

    #[test]
    fn test_message_roles() {
        assert_eq!(Message::system("s").role(), "system");
        assert_eq!(Message::human("h").role(), "human");
        assert_eq!(Message::assistant("a").role(), "assistant");
        assert_eq!(Message::tool_result("1", "t", "r").role(), "tool");
    }

    #[test]
    fn test_message_serialization_is_tagged() {
        let msg = Message::assistant_with_tool_calls("", vec![call("c1", "hotels_finder")]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["tool_calls"][0]["name"], "hotels_finder");

        let plain = serde_json::to_value(Message::assistant("done")).unwrap();
        assert!(plain.get("tool_calls").is_none());
    }

    #[test]
    fn test_non_object_arguments_are_wrapped() {
        let tc = ToolCallRequest::new("c1", "t", json!("raw"));
        assert_eq!(tc.arguments_value(), json!({"value": "raw"}));
        assert!(ToolCallRequest::new("c2", "t", Value::Null).arguments.is_empty());
    }

    #[test]
    fn test_tool_results_answer_pending_calls() {
        let mut conv = Conversation::new("t1");
        conv.push(Message::human("Plan Sydney to Melbourne")).unwrap();
        conv.push(Message::assistant_with_tool_calls(
            "",
            vec![call("c1", "flights_finder"), call("c2", "hotels_finder")],
        ))
        .unwrap();

        assert_eq!(conv.pending_tool_calls().len(), 2);
        conv.push(Message::tool_result("c1", "flights_finder", "ok")).unwrap();
        assert_eq!(conv.pending_tool_calls().len(), 1);
        conv.push(Message::tool_result("c2", "hotels_finder", "ok")).unwrap();
        assert!(conv.pending_tool_calls().is_empty());
    }

    #[test]
    fn test_orphan_tool_result_rejected() {
        let mut conv = Conversation::new("t1");
        conv.push(Message::human("hi")).unwrap();
        let err = conv.push(Message::tool_result("c1", "flights_finder", "x")).unwrap_err();
        assert!(matches!(err, Error::OrphanToolResult(ref id) if id == "c1"));
    }

    #[test]
    fn test_unknown_or_duplicate_call_id_rejected() {
        let mut conv = Conversation::new("t1");
        conv.push(Message::human("hi")).unwrap();
        conv.push(Message::assistant_with_tool_calls("", vec![call("c1", "weather_check")]))
            .unwrap();

        assert!(conv.push(Message::tool_result("zz", "weather_check", "x")).is_err());
        conv.push(Message::tool_result("c1", "weather_check", "x")).unwrap();
        assert!(conv.push(Message::tool_result("c1", "weather_check", "x")).is_err());
    }

    #[test]
    fn test_shared_call_id_accepts_one_result_per_call() {
        let mut conv = Conversation::new("t1");
        conv.push(Message::human("Weather in Cairns on two days")).unwrap();
        conv.push(Message::assistant_with_tool_calls(
            "",
            vec![call("weather_check", "weather_check"), call("weather_check", "weather_check")],
        ))
        .unwrap();

        conv.push(Message::tool_result("weather_check", "weather_check", "day 1")).unwrap();
        assert_eq!(conv.pending_tool_calls().len(), 1);
        conv.push(Message::tool_result("weather_check", "weather_check", "day 2")).unwrap();
        assert!(conv.pending_tool_calls().is_empty());

        // A third result has no call left to answer
        let err = conv
            .push(Message::tool_result("weather_check", "weather_check", "day 3"))
            .unwrap_err();
        assert!(matches!(err, Error::OrphanToolResult(_)));
    }

    #[test]
    fn test_first_human_content() {
        let mut conv = Conversation::new("t1");
        assert!(conv.first_human_content().is_none());
        conv.push(Message::human("first")).unwrap();
        conv.push(Message::assistant("reply")).unwrap();
        conv.push(Message::human("second")).unwrap();
        assert_eq!(conv.first_human_content(), Some("first"));
    }
}
