//! Tool executor
//!
//! Resolves each requested tool call against the registry, runs it, and
//! produces exactly one result message per request, in request order.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use super::conversation::{Message, ToolCallRequest};
use super::tool_result::format_tool_error;
use crate::error::ToolError;
use crate::tools::ToolRegistry;

/// Outcome of a single tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub call_id: String,
    pub name: String,
    pub success: bool,
    /// Text handed back to the model (formatted error on failure)
    pub content: String,
}

impl ToolOutcome {
    fn failed(call: &ToolCallRequest, error: &str) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            success: false,
            content: format_tool_error(&call.name, error),
        }
    }

    pub fn to_message(&self) -> Message {
        Message::tool_result(&self.call_id, &self.name, &self.content)
    }
}

/// Result of one executor pass
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// One outcome per request, same order as the requests
    pub outcomes: Vec<ToolOutcome>,
    /// Names of tools that failed in this pass, each listed once
    pub failed_tools: Vec<String>,
}

impl ExecutionReport {
    pub fn has_failures(&self) -> bool {
        !self.failed_tools.is_empty()
    }

    /// Tool-result messages, in request order
    pub fn messages(&self) -> Vec<Message> {
        self.outcomes.iter().map(ToolOutcome::to_message).collect()
    }
}

/// Runs tool calls against a registry
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    parallel: bool,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            parallel: true,
        }
    }

    /// Run the calls of one pass concurrently (results keep request order)
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute every request and collect the outcomes
    pub async fn execute(&self, requests: &[ToolCallRequest]) -> ExecutionReport {
        let outcomes = if self.parallel {
            join_all(requests.iter().map(|call| self.execute_one(call))).await
        } else {
            let mut outcomes = Vec::with_capacity(requests.len());
            for call in requests {
                outcomes.push(self.execute_one(call).await);
            }
            outcomes
        };

        let mut failed_tools: Vec<String> = Vec::new();
        for outcome in outcomes.iter().filter(|o| !o.success) {
            if !failed_tools.contains(&outcome.name) {
                failed_tools.push(outcome.name.clone());
            }
        }

        ExecutionReport {
            outcomes,
            failed_tools,
        }
    }

    async fn execute_one(&self, call: &ToolCallRequest) -> ToolOutcome {
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, call_id = %call.id, "Model requested unknown tool");
            return ToolOutcome::failed(call, &ToolError::NotFound(call.name.clone()).to_string());
        };

        debug!(tool = %call.name, call_id = %call.id, "Executing tool");
        match tool.execute(call.arguments_value()).await {
            Ok(output) => match output.failure_message() {
                Some(error) => {
                    warn!(tool = %call.name, call_id = %call.id, %error, "Tool returned an error payload");
                    ToolOutcome::failed(call, &error)
                }
                None => ToolOutcome {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    success: true,
                    content: output.content_text(),
                },
            },
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool execution failed");
                ToolOutcome::failed(call, &e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{FnTool, Tool, ToolOutput};
    use serde_json::json;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(FnTool::new("ok_tool", "ok", json!({}), |_| async {
                Ok(ToolOutput::success(json!({"status": "fine"})))
            })),
            Arc::new(FnTool::new("map_error", "fails softly", json!({}), |_| async {
                Ok(ToolOutput::success(json!({"error": "X"})))
            })),
            Arc::new(FnTool::new("raise_error", "fails hard", json!({}), |_| async {
                Err(ToolError::ExecutionFailed("X".to_string()))
            })),
        ];
        for tool in tools {
            registry.register(tool).unwrap();
        }
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_results_keep_request_order() {
        let executor = ToolExecutor::new(registry());
        let calls = vec![
            ToolCallRequest::new("c1", "raise_error", json!({})),
            ToolCallRequest::new("c2", "ok_tool", json!({})),
            ToolCallRequest::new("c3", "missing", json!({})),
        ];

        let report = executor.execute(&calls).await;
        let ids: Vec<&str> = report.outcomes.iter().map(|o| o.call_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(report.messages().len(), 3);
        assert_eq!(report.failed_tools, vec!["raise_error", "missing"]);
    }

    #[tokio::test]
    async fn test_error_payload_and_raised_error_format_identically() {
        let executor = ToolExecutor::new(registry());
        let report = executor
            .execute(&[
                ToolCallRequest::new("a", "map_error", json!({})),
                ToolCallRequest::new("b", "raise_error", json!({})),
            ])
            .await;

        assert_eq!(
            report.outcomes[0].content,
            "[MAP_ERROR ERROR] X. The assistant will continue with available information."
        );
        assert_eq!(
            report.outcomes[1].content,
            "[RAISE_ERROR ERROR] X. The assistant will continue with available information."
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_failure() {
        let executor = ToolExecutor::new(registry()).with_parallel(false);
        let report = executor
            .execute(&[ToolCallRequest::new("c1", "nope", json!({}))])
            .await;

        assert!(report.has_failures());
        assert_eq!(
            report.outcomes[0].content,
            "[NOPE ERROR] Tool 'nope' not found. The assistant will continue with available information."
        );
    }

    #[tokio::test]
    async fn test_success_content_is_stringified() {
        let executor = ToolExecutor::new(registry());
        let report = executor
            .execute(&[ToolCallRequest::new("c1", "ok_tool", json!({}))])
            .await;

        assert!(!report.has_failures());
        assert_eq!(report.outcomes[0].content, r#"{"status":"fine"}"#);
    }

    #[tokio::test]
    async fn test_failed_names_listed_once() {
        let executor = ToolExecutor::new(registry());
        let report = executor
            .execute(&[
                ToolCallRequest::new("c1", "map_error", json!({})),
                ToolCallRequest::new("c2", "map_error", json!({})),
            ])
            .await;
        assert_eq!(report.failed_tools, vec!["map_error"]);
        assert_eq!(report.outcomes.len(), 2);
    }
}
