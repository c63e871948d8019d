//! Model client abstraction
//!
//! The agent loop talks to the language model through [`ModelClient`]. The
//! production implementation goes through the genai framework, which
//! supports:
//! - OpenAI (GPT-4o, etc.)
//! - Anthropic (Claude)
//! - Google Gemini
//! - Groq
//! - DeepSeek
//! - Ollama (local)

mod genai_provider;
pub mod logging;

pub use genai_provider::GenAIProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::orchestration::Message;
use crate::tools::ToolDefinition;

/// A language model with the tool schemas already bound
///
/// Given the conversation (system prompt first), returns one assistant
/// message that either carries text or tool calls.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn invoke(&self, messages: &[Message]) -> Result<Message>;

    /// Model identifier, for logging
    fn model(&self) -> &str {
        "unknown"
    }
}

/// Supported LLM provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Gemini,
    Groq,
    DeepSeek,
    /// Ollama (local, no key)
    Ollama,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "anthropic" => Ok(ProviderType::Anthropic),
            "gemini" | "google" => Ok(ProviderType::Gemini),
            "groq" => Ok(ProviderType::Groq),
            "deepseek" => Ok(ProviderType::DeepSeek),
            "ollama" => Ok(ProviderType::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Gemini => "gemini",
            ProviderType::Groq => "groq",
            ProviderType::DeepSeek => "deepseek",
            ProviderType::Ollama => "ollama",
        }
    }

    /// Get the default model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "gpt-4o",
            ProviderType::Anthropic => "claude-sonnet-4-20250514",
            ProviderType::Gemini => "gemini-2.0-flash",
            ProviderType::Groq => "llama-3.3-70b-versatile",
            ProviderType::DeepSeek => "deepseek-chat",
            ProviderType::Ollama => "llama3.2",
        }
    }

    /// Get the environment variable name for the API key
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::Groq => Some("GROQ_API_KEY"),
            ProviderType::DeepSeek => Some("DEEPSEEK_API_KEY"),
            ProviderType::Ollama => None,
        }
    }
}

/// Create a model client from configuration with the given tools bound
pub fn create_provider_from_config(config: &ProviderConfig, tools: Vec<ToolDefinition>) -> Result<GenAIProvider> {
    let provider_type: ProviderType = config.provider_type.parse().map_err(Error::Config)?;
    let model = config.effective_model();

    let provider = match config.get_api_key() {
        Some(key) => GenAIProvider::with_api_key(provider_type, &key, Some(&model)),
        None if provider_type.api_key_env().is_none() => GenAIProvider::new(provider_type, Some(&model)),
        None => {
            return Err(Error::Config(format!(
                "No API key for provider '{}'. Set {} or api_key in [provider] config.",
                provider_type,
                config
                    .api_key_env
                    .as_deref()
                    .or(provider_type.api_key_env())
                    .unwrap_or("an API key"),
            )));
        }
    };

    Ok(provider.with_tools(tools))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!("OpenAI".parse::<ProviderType>().unwrap(), ProviderType::OpenAI);
        assert_eq!("google".parse::<ProviderType>().unwrap(), ProviderType::Gemini);
        assert!("nope".parse::<ProviderType>().is_err());
        assert_eq!(ProviderType::Anthropic.to_string(), "anthropic");
    }

    #[test]
    fn test_create_provider_with_configured_key() {
        let config = ProviderConfig {
            provider_type: "anthropic".to_string(),
            api_key: Some("sk-test".to_string()),
            api_key_env: None,
            model: "claude-sonnet-4-20250514".to_string(),
        };
        let provider = create_provider_from_config(&config, Vec::new()).unwrap();
        assert_eq!(provider.provider_type(), ProviderType::Anthropic);
        assert_eq!(ModelClient::model(&provider), "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_create_provider_without_key_fails() {
        let config = ProviderConfig {
            provider_type: "deepseek".to_string(),
            api_key: None,
            api_key_env: Some("WAYFARER_TEST_UNSET_KEY".to_string()),
            model: "deepseek-chat".to_string(),
        };
        let err = create_provider_from_config(&config, Vec::new()).err().unwrap();
        assert!(err.to_string().contains("WAYFARER_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = ProviderConfig {
            provider_type: "ollama".to_string(),
            api_key: None,
            api_key_env: None,
            model: "llama3.2".to_string(),
        };
        assert!(create_provider_from_config(&config, Vec::new()).is_ok());
    }
}
