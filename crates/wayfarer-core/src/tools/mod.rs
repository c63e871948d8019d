//! Tool system for the Wayfarer agent
//!
//! Tools are the capabilities the model may call. Each tool has:
//! - A unique name and a description for the LLM
//! - A JSON schema for its single structured argument
//! - An execute method
//!
//! A tool reports failure in one of two ways, and the executor treats both
//! the same: it returns `Err(ToolError)`, or it returns an output whose
//! payload is error-shaped (see [`ToolOutput::failure_message`]).

pub mod travel;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{Error, Result, ToolError};

/// Boxed future type for object-safe async trait methods
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Output from a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Whether the tool succeeded
    pub success: bool,
    /// The output content (can be text, JSON, etc.)
    pub content: Value,
    /// Optional error message
    pub error: Option<String>,
}

impl ToolOutput {
    pub fn success(content: impl Into<Value>) -> Self {
        Self {
            success: true,
            content: content.into(),
            error: None,
        }
    }

    /// An error-shaped payload: `{"error": message}`
    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            content: serde_json::json!({ "error": message }),
            error: Some(message),
        }
    }

    /// The failure text if this output counts as a failed call.
    ///
    /// An output fails when it was built with [`ToolOutput::error`] or when
    /// its content is a map carrying an `"error"` key.
    pub fn failure_message(&self) -> Option<String> {
        if let Some(message) = &self.error {
            return Some(message.clone());
        }
        match self.content.get("error") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None if !self.success => Some("Tool reported failure".to_string()),
            None => None,
        }
    }

    /// Render the content as the text handed back to the model
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Tool definition for LLM consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Core trait for all tools
pub trait Tool: Send + Sync {
    /// Tool name (used by LLM to invoke)
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON schema for parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with given parameters
    fn execute(&self, params: Value) -> BoxFuture<'_, std::result::Result<ToolOutput, ToolError>>;

    /// Convert to tool definition for LLM
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

type ToolFn = dyn Fn(Value) -> BoxFuture<'static, std::result::Result<ToolOutput, ToolError>> + Send + Sync;

/// A tool backed by a closure
///
/// Lets callers plug an arbitrary async callable into the registry without
/// writing a dedicated type.
pub struct FnTool {
    name: String,
    description: String,
    schema: Value,
    handler: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, schema: Value, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<ToolOutput, ToolError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler: Box::new(
                move |params| -> BoxFuture<'static, std::result::Result<ToolOutput, ToolError>> {
                    Box::pin(handler(params))
                },
            ),
        }
    }
}

impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.schema.clone()
    }

    fn execute(&self, params: Value) -> BoxFuture<'_, std::result::Result<ToolOutput, ToolError>> {
        (self.handler)(params)
    }
}

/// Registry of available tools
///
/// Built once when the agent is constructed and read-only afterwards.
/// Registration order is preserved so the schemas bound to the model are
/// stable between runs.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, rejecting a second tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    /// Tool definitions in registration order
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Registered tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Helper macro for creating tool parameter schemas
#[macro_export]
macro_rules! tool_params {
    ($($field:ident : $type:expr => $desc:expr),* $(,)?) => {
        serde_json::json!({
            "type": "object",
            "properties": {
                $( stringify!($field): { "type": $type, "description": $desc } ),*
            },
            "required": [ $( stringify!($field) ),* ]
        })
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_tool(name: &str) -> Arc<dyn Tool> {
        Arc::new(FnTool::new(
            name,
            "Echo the arguments back",
            crate::tool_params!(text: "string" => "Text to echo"),
            |params| async move { Ok(ToolOutput::success(params)) },
        ))
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("echo")).unwrap();

        assert!(registry.get("echo").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("echo")).unwrap();

        let err = registry.register(echo_tool("echo")).unwrap_err();
        assert!(matches!(err, Error::DuplicateTool(ref name) if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("zeta")).unwrap();
        registry.register(echo_tool("alpha")).unwrap();

        let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(registry.names(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_failure_message_from_error_constructor() {
        let output = ToolOutput::error("quota exceeded");
        assert_eq!(output.failure_message().as_deref(), Some("quota exceeded"));
        assert_eq!(output.content, json!({"error": "quota exceeded"}));
    }

    #[test]
    fn test_failure_message_from_error_key() {
        let output = ToolOutput::success(json!({"error": "no results"}));
        assert_eq!(output.failure_message().as_deref(), Some("no results"));

        let info = ToolOutput::success(json!({"info": "forecast unavailable"}));
        assert!(info.failure_message().is_none());
    }

    #[test]
    fn test_content_text() {
        assert_eq!(ToolOutput::success("plain").content_text(), "plain");
        assert_eq!(ToolOutput::success(json!([1, 2])).content_text(), "[1,2]");
    }

    #[tokio::test]
    async fn test_fn_tool_executes() {
        let tool = echo_tool("echo");
        let output = tool.execute(json!({"text": "hi"})).await.unwrap();
        assert!(output.success);
        assert_eq!(output.content["text"], "hi");
    }
}
