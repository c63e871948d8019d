//! LLM request/response logging utilities
//!
//! Set the `WAYFARER_LLM_LOG` environment variable to a file path to append
//! one JSON object per model call (request messages, bound tools, response
//! or error).
//!
//! Example: `WAYFARER_LLM_LOG=/tmp/llm.jsonl wayfarer chat`

use serde_json::json;
use std::io::Write;
use tracing::{debug, warn};

use crate::orchestration::Message;
use crate::tools::ToolDefinition;

/// Environment variable naming the log file
pub const LLM_LOG_ENV: &str = "WAYFARER_LLM_LOG";

/// Configuration for what to include in the log entry
#[derive(Default)]
pub struct LogConfig<'a> {
    /// The model used for this request
    pub model: &'a str,
    /// Provider name (e.g., "openai")
    pub provider: Option<&'a str>,
    /// Messages in the request, system prompt included
    pub messages: &'a [Message],
    /// Tools bound for the request
    pub tools: Option<&'a [ToolDefinition]>,
    /// Parsed response message
    pub result: Option<&'a Message>,
    /// Error message if the request failed
    pub error: Option<&'a str>,
}

/// Build the JSON entry for one interaction
pub fn log_entry(config: &LogConfig<'_>) -> serde_json::Value {
    json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "model": config.model,
        "provider": config.provider,
        "request": {
            "messages": config.messages,
            "message_count": config.messages.len(),
            "tools": config.tools.map(|t| t.iter().map(|tool| tool.name.as_str()).collect::<Vec<_>>()),
            "tool_count": config.tools.map(|t| t.len()).unwrap_or(0),
        },
        "response": config.result.map(|r| json!({
            "type": if r.has_tool_calls() { "tool_calls" } else { "message" },
            "content": r.content(),
            "tool_calls": r.tool_calls(),
        })),
        "error": config.error,
    })
}

/// Append an interaction to the log file if `WAYFARER_LLM_LOG` is set
pub fn log_llm_interaction(config: LogConfig<'_>) {
    let log_file = match std::env::var(LLM_LOG_ENV) {
        Ok(path) if !path.is_empty() => path,
        _ => return,
    };

    let entry = log_entry(&config);

    match std::fs::OpenOptions::new().create(true).append(true).open(&log_file) {
        Ok(mut file) => {
            if let Err(e) = writeln!(file, "{}", entry) {
                warn!("Failed to write to LLM log file: {}", e);
            }
        }
        Err(e) => {
            warn!("Failed to open LLM log file {}: {}", log_file, e);
        }
    }

    debug!("Logged LLM interaction to {}", log_file);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::ToolCallRequest;

    #[test]
    fn test_log_entry_for_tool_call_response() {
        let messages = vec![Message::system("prompt"), Message::human("Plan Perth")];
        let response = Message::assistant_with_tool_calls(
            "",
            vec![ToolCallRequest::new("c1", "weather_check", json!({"location": "Perth"}))],
        );
        let entry = log_entry(&LogConfig {
            model: "gpt-4o",
            messages: &messages,
            result: Some(&response),
            ..Default::default()
        });

        assert_eq!(entry["request"]["message_count"], 2);
        assert_eq!(entry["request"]["messages"][1]["role"], "human");
        assert_eq!(entry["response"]["type"], "tool_calls");
        assert_eq!(entry["response"]["tool_calls"][0]["name"], "weather_check");
        assert!(entry["error"].is_null());
    }

    #[test]
    fn test_log_entry_for_error() {
        let entry = log_entry(&LogConfig {
            model: "gpt-4o",
            error: Some("rate limited"),
            ..Default::default()
        });
        assert!(entry["response"].is_null());
        assert_eq!(entry["error"], "rate limited");
    }
}
