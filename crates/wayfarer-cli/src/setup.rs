//! Setup wizard for first-run configuration
//!
//! Walks through provider selection and the three API keys the planner
//! needs, then writes the config file.

use console::style;
use dialoguer::{Confirm, Password, Select, theme::ColorfulTheme};

use wayfarer_core::config::ConfigManager;
use wayfarer_core::provider::ProviderType;

/// Provider display metadata for the wizard
struct ProviderDisplay {
    provider: ProviderType,
    display_name: &'static str,
    signup_url: &'static str,
}

const PROVIDERS: &[ProviderDisplay] = &[
    ProviderDisplay {
        provider: ProviderType::OpenAI,
        display_name: "OpenAI (GPT-4o)",
        signup_url: "https://platform.openai.com/",
    },
    ProviderDisplay {
        provider: ProviderType::Anthropic,
        display_name: "Anthropic (Claude)",
        signup_url: "https://console.anthropic.com/",
    },
    ProviderDisplay {
        provider: ProviderType::Gemini,
        display_name: "Google Gemini",
        signup_url: "https://aistudio.google.com/",
    },
    ProviderDisplay {
        provider: ProviderType::Groq,
        display_name: "Groq",
        signup_url: "https://console.groq.com/",
    },
    ProviderDisplay {
        provider: ProviderType::DeepSeek,
        display_name: "DeepSeek",
        signup_url: "https://platform.deepseek.com/",
    },
    ProviderDisplay {
        provider: ProviderType::Ollama,
        display_name: "Ollama (Local)",
        signup_url: "https://ollama.ai/",
    },
];

pub struct SetupWizard {
    config_manager: ConfigManager,
}

impl SetupWizard {
    pub fn new(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        println!();
        println!("{}", style("Wayfarer setup").bold().cyan());
        println!("{}", style("Let's get you set up in three steps.").dim());
        println!();

        self.select_provider()?;
        self.tool_keys()?;

        self.config_manager.save()?;
        println!();
        println!(
            "  {} {}",
            style("✓").green().bold(),
            style(format!("Saved {}", self.config_manager.path().display())).green()
        );
        println!();
        println!("Run {} to start planning.", style("wayfarer").cyan());
        Ok(())
    }

    fn select_provider(&mut self) -> anyhow::Result<()> {
        println!("{} {}", style("Step 1 of 3:").bold().cyan(), style("Choose your AI provider").bold());
        println!();

        let items: Vec<&str> = PROVIDERS.iter().map(|p| p.display_name).collect();
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select a provider")
            .items(&items)
            .default(0)
            .interact()?;
        let choice = &PROVIDERS[selection];

        let provider = &mut self.config_manager.config_mut().provider;
        provider.provider_type = choice.provider.as_str().to_string();
        provider.model = choice.provider.default_model().to_string();
        provider.api_key_env = choice.provider.api_key_env().map(str::to_string);
        provider.api_key = None;

        println!();
        println!("{} {}", style("Step 2 of 3:").bold().cyan(), style("Enter your model API key").bold());
        println!();

        let Some(env_var) = choice.provider.api_key_env() else {
            println!("  {}", style("Ollama runs locally, no API key needed.").dim());
            println!();
            return Ok(());
        };

        println!("  Get your API key at: {}", style(choice.signup_url).cyan().underlined());
        println!(
            "  {}",
            style(format!("Tip: you can also set the {} environment variable.", env_var)).dim()
        );
        println!();

        let key = Password::with_theme(&ColorfulTheme::default())
            .with_prompt(env_var)
            .allow_empty_password(true)
            .interact()?;
        if !key.is_empty() {
            self.config_manager.config_mut().provider.api_key = Some(key);
        }
        println!();
        Ok(())
    }

    fn tool_keys(&mut self) -> anyhow::Result<()> {
        println!("{} {}", style("Step 3 of 3:").bold().cyan(), style("Travel data keys").bold());
        println!();
        println!(
            "  {}",
            style("Flights and hotels come from SerpAPI, forecasts from WeatherAPI.com.").dim()
        );
        println!(
            "  {}",
            style("Without them the planner still answers, with less live data.").dim()
        );
        println!();

        if Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Set a SerpAPI key?")
            .default(true)
            .interact()?
        {
            println!("  Get your API key at: {}", style("https://serpapi.com/").cyan().underlined());
            let key = Password::with_theme(&ColorfulTheme::default())
                .with_prompt("SERPAPI_API_KEY")
                .allow_empty_password(true)
                .interact()?;
            if !key.is_empty() {
                self.config_manager.config_mut().tools.serpapi_api_key = Some(key);
            }
        }

        if Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Set a WeatherAPI.com key?")
            .default(true)
            .interact()?
        {
            println!("  Get your API key at: {}", style("https://www.weatherapi.com/").cyan().underlined());
            let key = Password::with_theme(&ColorfulTheme::default())
                .with_prompt("WEATHER_API_KEY")
                .allow_empty_password(true)
                .interact()?;
            if !key.is_empty() {
                self.config_manager.config_mut().tools.weather_api_key = Some(key);
            }
        }
        Ok(())
    }
}
