//! Wayfarer Core - tool-calling travel agent
//!
//! This crate provides the core functionality for the Wayfarer planner:
//! - The agent loop (model → tools → model) with its retry/fallback policy
//! - Conversation state and per-thread persistence
//! - Tool system with flight, hotel and weather tools
//! - Model clients through genai
//! - Trip request prompt building

pub mod config;
pub mod error;
pub mod orchestration;
pub mod provider;
pub mod session;
pub mod tools;
pub mod trip;

pub use config::{AgentConfig, Config, ConfigManager, FailureScope, ProviderConfig, StorageConfig, ToolsConfig};
pub use error::{Error, Result, ToolError};
pub use provider::{GenAIProvider, ModelClient, ProviderType, create_provider_from_config};
pub use tools::{FnTool, Tool, ToolDefinition, ToolOutput, ToolRegistry};

// Orchestration exports
pub use orchestration::{
    Conversation, ExecutionReport, Message, SystemPrompt, ToolCallRequest, ToolExecutor, ToolOutcome,
    ToolRegistryBuilder, create_travel_tool_registry, detect_error_markers, fallback_request, format_tool_error,
};

// Session exports
pub use session::{
    Agent, AgentEvent, AgentInput, AgentLoop, AgentOutput, AgentState, ConversationStore, FileStore,
    InvokeConfig, MemoryStore, RunState,
};

pub use trip::{AIRPORTS, Airport, EnergyLevel, TripRequest, TripType, find_airport};
