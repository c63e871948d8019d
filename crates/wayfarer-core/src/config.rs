//! Configuration management for Wayfarer
//!
//! Handles loading, saving, and managing application configuration
//! including API keys, provider settings, agent policy and tool settings.

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Agent loop policy
    #[serde(default)]
    pub agent: AgentConfig,
    /// Travel tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Conversation persistence
    #[serde(default)]
    pub storage: StorageConfig,
}

/// LLM Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider type: "openai", "anthropic", "gemini", etc.
    pub provider_type: String,
    /// API key (can be loaded from env)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable name for API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Model to use
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::openai()
    }
}

impl ProviderConfig {
    /// Create OpenAI provider config
    pub fn openai() -> Self {
        Self {
            provider_type: "openai".to_string(),
            api_key: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            model: "gpt-4o".to_string(),
        }
    }

    /// Create Anthropic provider config
    pub fn anthropic() -> Self {
        Self {
            provider_type: "anthropic".to_string(),
            api_key: None,
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
            model: "claude-sonnet-4-20250514".to_string(),
        }
    }

    /// Get the API key, checking environment variable if not set directly
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key
            && !key.is_empty()
        {
            return Some(key.clone());
        }

        self.api_key_env
            .as_deref()
            .and_then(|env_name| std::env::var(env_name).ok())
            .filter(|key| !key.is_empty())
    }

    /// Model to use, honouring the `OPENAI_MODEL` override for OpenAI
    pub fn effective_model(&self) -> String {
        if self.provider_type == "openai"
            && let Ok(model) = std::env::var("OPENAI_MODEL")
            && !model.is_empty()
        {
            return model;
        }
        self.model.clone()
    }
}

/// Where the tool-failure counter lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureScope {
    /// One counter per conversation thread
    #[default]
    Thread,
    /// One counter per agent instance, shared by every thread
    Agent,
}

/// Agent loop policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Failed tool passes tolerated before the fallback plan is produced
    pub max_retries: u32,
    /// Hard cap on model calls per turn (None = unbounded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    /// Run the tool calls of one pass concurrently
    pub parallel_tools: bool,
    /// Scope of the failure counter
    pub failure_scope: FailureScope,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_iterations: Some(50),
            parallel_tools: true,
            failure_scope: FailureScope::Thread,
        }
    }
}

/// Travel tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// SerpAPI key for flights and hotels (falls back to SERPAPI_API_KEY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serpapi_api_key: Option<String>,
    /// WeatherAPI.com key (falls back to WEATHER_API_KEY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_api_key: Option<String>,
    /// Attempts made against the flight search upstream
    pub flight_retries: u32,
    /// Fixed delay between flight search attempts (seconds)
    pub flight_retry_delay_secs: u64,
    /// Days ahead for which a real forecast is requested
    pub forecast_horizon_days: i64,
    /// HTTP request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            serpapi_api_key: None,
            weather_api_key: None,
            flight_retries: 3,
            flight_retry_delay_secs: 2,
            forecast_horizon_days: 14,
            request_timeout_secs: 30,
        }
    }
}

impl ToolsConfig {
    /// SerpAPI key from config or `SERPAPI_API_KEY`
    pub fn serpapi_key(&self) -> Option<String> {
        key_or_env(self.serpapi_api_key.as_deref(), "SERPAPI_API_KEY")
    }

    /// WeatherAPI key from config or `WEATHER_API_KEY`
    pub fn weather_key(&self) -> Option<String> {
        key_or_env(self.weather_api_key.as_deref(), "WEATHER_API_KEY")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn flight_retry_delay(&self) -> Duration {
        Duration::from_secs(self.flight_retry_delay_secs)
    }
}

fn key_or_env(configured: Option<&str>, env_name: &str) -> Option<String> {
    configured
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(env_name).ok().filter(|k| !k.is_empty()))
}

/// Conversation persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for saved threads (defaults to the platform data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the threads directory
    pub fn threads_dir(&self) -> PathBuf {
        self.threads_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|p| p.join("wayfarer"))
                .unwrap_or_else(|| PathBuf::from(".wayfarer"))
                .join("threads")
        })
    }
}

/// Configuration manager for loading and saving config
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::with_path(config_path)
    }

    /// Create a config manager with a specific path
    pub fn with_path(config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            Config::default()
        };

        Ok(Self { config_path, config })
    }

    /// Get the default config path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("wayfarer").join("config.toml"))
    }

    /// Load configuration from a file
    fn load_from_path(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Path the configuration is read from and saved to
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&self.config_path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Get API key for the configured provider
    pub fn get_api_key(&self) -> Option<String> {
        self.config.provider.get_api_key()
    }

    /// Check if an API key is configured for the provider
    pub fn has_api_key(&self) -> bool {
        self.get_api_key().is_some()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_path: PathBuf::from("config.toml"),
            config: Config::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.provider_type, "openai");
        assert_eq!(config.provider.model, "gpt-4o");
        assert_eq!(config.agent.max_retries, 3);
        assert_eq!(config.agent.failure_scope, FailureScope::Thread);
        assert!(config.agent.parallel_tools);
        assert_eq!(config.tools.flight_retries, 3);
        assert_eq!(config.tools.forecast_horizon_days, 14);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[provider]"));
        assert!(toml_str.contains("[agent]"));
        assert!(toml_str.contains("failure_scope = \"thread\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.agent.max_retries, config.agent.max_retries);
        assert_eq!(parsed.provider.model, config.provider.model);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [agent]
            failure_scope = "agent"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.agent.failure_scope, FailureScope::Agent);
        assert_eq!(parsed.agent.max_retries, 3);
        assert_eq!(parsed.provider.provider_type, "openai");
    }

    #[test]
    fn test_configured_key_wins_over_env() {
        let tools = ToolsConfig {
            serpapi_api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(tools.serpapi_key().as_deref(), Some("from-config"));
    }

    #[test]
    fn test_config_manager_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut manager = ConfigManager::with_path(path.clone()).unwrap();
        manager.config_mut().agent.max_retries = 5;
        manager.save().unwrap();

        let reloaded = ConfigManager::with_path(path).unwrap();
        assert_eq!(reloaded.config().agent.max_retries, 5);
    }
}
