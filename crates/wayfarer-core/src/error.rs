//! Error types for Wayfarer Core

use thiserror::Error;

/// Result type alias using Wayfarer Error
pub type Result<T> = std::result::Result<T, Error>;

/// Wayfarer error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// The language-model call itself failed. Never retried, never counted
    /// toward the fallback threshold.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Tool result for call '{0}' does not answer a pending tool call")]
    OrphanToolResult(String),

    #[error("Agent loop exceeded {0} iterations")]
    IterationLimit(usize),

    #[error("Invalid trip request: {0}")]
    InvalidTrip(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Tool-specific errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool '{0}' not found")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Displays the bare message so a raised failure and an error payload
    /// with the same text format identically.
    #[error("{0}")]
    ExecutionFailed(String),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}
