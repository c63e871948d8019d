//! Orchestration module for the agent loop's building blocks
//!
//! - Conversation state and messages
//! - System and fallback prompts
//! - Tool registry construction and tool execution
//! - Tool result formatting

pub mod conversation;
mod system_prompt;
mod tool_executor;
mod tool_registry;
mod tool_result;

pub use conversation::{Conversation, Message, ToolCallRequest};
pub use system_prompt::{SystemPrompt, current_year, fallback_request};
pub use tool_executor::{ExecutionReport, ToolExecutor, ToolOutcome};
pub use tool_registry::{ToolRegistryBuilder, create_travel_tool_registry};
pub use tool_result::{detect_error_markers, format_tool_error};
