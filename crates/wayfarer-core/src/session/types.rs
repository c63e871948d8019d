//! Agent invocation types
//!
//! These types define the boundary between front ends (CLI, web) and the
//! agent: what goes in, what comes out, and the progress events emitted
//! while a turn runs.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::orchestration::{Message, detect_error_markers};

/// Unique identifier for a conversation thread
pub type ThreadId = String;

/// Channel carrying `(thread_id, event)` pairs to a front end
pub type EventSender = mpsc::Sender<(ThreadId, AgentEvent)>;

/// Type alias for the event receiver
pub type EventReceiver = mpsc::Receiver<(ThreadId, AgentEvent)>;

/// Messages appended to the thread before the turn runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentInput {
    pub messages: Vec<Message>,
}

impl AgentInput {
    /// A single human message
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::human(content)],
        }
    }
}

/// Per-call configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeConfig {
    /// Selects (or creates) the persisted conversation
    pub thread_id: ThreadId,
}

impl InvokeConfig {
    pub fn new(thread_id: impl Into<ThreadId>) -> Self {
        Self {
            thread_id: thread_id.into(),
        }
    }

    /// Configuration for a brand-new thread
    pub fn new_thread() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

/// The thread's full history after the turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    pub thread_id: ThreadId,
    pub messages: Vec<Message>,
}

impl AgentOutput {
    /// The final assistant message of the turn
    pub fn final_message(&self) -> Option<&Message> {
        self.messages.last().filter(|m| m.is_assistant())
    }

    /// Text of the final answer (empty if there is none)
    pub fn final_text(&self) -> &str {
        self.final_message().map(Message::content).unwrap_or_default()
    }

    /// Tool names flagged by error markers in the final answer
    pub fn degraded_tools(&self) -> Vec<String> {
        detect_error_markers(self.final_text())
    }
}

/// Progress events emitted while a turn runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// The model is being called (1-based within the turn)
    ModelCall { iteration: usize },
    /// A tool call is about to run
    ToolStarted { call_id: String, name: String },
    /// A tool call finished
    ToolFinished {
        call_id: String,
        name: String,
        success: bool,
    },
    /// The failure threshold was reached; a fallback plan is being generated
    FallbackTriggered { failed_tools: Vec<String>, failures: u32 },
    /// The turn produced its final answer
    FinalAnswer { content: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_text_and_markers() {
        let output = AgentOutput {
            thread_id: "t".to_string(),
            messages: vec![
                Message::human("Plan Sydney to Melbourne"),
                Message::assistant("[FLIGHTS_FINDER ERROR] API key missing. Here is a plan anyway."),
            ],
        };
        assert!(output.final_text().starts_with("[FLIGHTS_FINDER ERROR]"));
        assert_eq!(output.degraded_tools(), vec!["FLIGHTS_FINDER"]);
    }

    #[test]
    fn test_no_final_message() {
        let output = AgentOutput {
            thread_id: "t".to_string(),
            messages: vec![Message::human("hi")],
        };
        assert!(output.final_message().is_none());
        assert_eq!(output.final_text(), "");
    }

    #[test]
    fn test_event_serialization() {
        let event = AgentEvent::ToolFinished {
            call_id: "c1".to_string(),
            name: "weather_check".to_string(),
            success: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "tool_finished");
        assert_eq!(json["success"], false);
    }

    #[test]
    fn test_new_threads_are_distinct() {
        assert_ne!(InvokeConfig::new_thread(), InvokeConfig::new_thread());
    }
}
