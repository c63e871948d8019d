//! Wayfarer CLI - conversational travel planner
//!
//! Drives the core agent from the terminal: interactive chat, one-shot
//! prompts, structured trip planning, and saved-thread management.

mod render;
mod setup;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error};

use wayfarer_core::config::{Config, ConfigManager};
use wayfarer_core::orchestration::create_travel_tool_registry;
use wayfarer_core::provider::ProviderType;
use wayfarer_core::session::{Agent, AgentOutput, ConversationStore, EventReceiver, FileStore};
use wayfarer_core::trip::{AIRPORTS, EnergyLevel, TripRequest, TripType};

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Conversational travel planner with live flight, hotel and weather lookups", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// LLM Provider (openai, anthropic, gemini, ...) - defaults to config setting
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model to use (defaults to provider's default)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat mode
    Chat {
        /// Resume a saved thread
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// Send a single message and print the answer
    Ask {
        /// The message
        prompt: String,

        /// Thread to continue (a new one is created otherwise)
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// Plan a trip from structured details
    Plan {
        /// Departure airport IATA code
        #[arg(long)]
        from: String,

        /// Destination airport IATA code
        #[arg(long)]
        to: String,

        /// Outbound / check-in date (YYYY-MM-DD)
        #[arg(long)]
        check_in: NaiveDate,

        /// Return / check-out date (YYYY-MM-DD)
        #[arg(long)]
        check_out: Option<NaiveDate>,

        /// One-way trip
        #[arg(long)]
        one_way: bool,

        /// Free-text preferences (e.g. "near the beach, vegetarian food")
        #[arg(long, default_value = "")]
        preferences: String,

        /// Energy level: relaxed, balanced or active
        #[arg(long, default_value_t = EnergyLevel::Balanced)]
        energy: EnergyLevel,

        /// Total budget in AUD
        #[arg(long)]
        budget: Option<String>,

        /// Thread to plan in (a new one is created otherwise)
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// Show available tools
    Tools,

    /// List known airports
    Airports,

    /// Show or initialize configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Manage saved conversation threads
    #[command(subcommand)]
    Threads(ThreadCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Write a default config file if none exists
    Init,

    /// Interactive setup: provider and API keys
    Setup,
}

#[derive(Subcommand)]
enum ThreadCommands {
    /// List saved threads, most recent first
    List,

    /// Print a thread's history
    Show {
        /// Thread id
        id: String,
    },

    /// Delete a saved thread
    Delete {
        /// Thread id
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Warn by default so logs don't interleave with the chat prompt;
    // RUST_LOG takes precedence when set
    let default_filter = if cli.verbose { "info,wayfarer_core=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone())?,
        None => ConfigManager::new()?,
    };
    let config = apply_overrides(config_manager.config().clone(), &cli)?;

    match cli.command {
        Some(Commands::Chat { thread }) => run_chat(&config, thread).await?,
        Some(Commands::Ask { prompt, thread }) => run_ask(&config, thread, &prompt).await?,
        Some(Commands::Plan {
            from,
            to,
            check_in,
            check_out,
            one_way,
            preferences,
            energy,
            budget,
            thread,
        }) => {
            let request = TripRequest {
                trip_type: if one_way { TripType::OneWay } else { TripType::Return },
                departure: from.to_uppercase(),
                destination: to.to_uppercase(),
                check_in,
                check_out: if one_way { None } else { check_out },
                preferences,
                energy_level: energy,
                budget_aud: budget,
            };
            run_plan(&config, thread, &request).await?
        }
        Some(Commands::Tools) => show_tools(&config)?,
        Some(Commands::Airports) => show_airports(),
        Some(Commands::Config(cmd)) => handle_config_command(config_manager, &config, cmd)?,
        Some(Commands::Threads(cmd)) => handle_thread_command(&config, cmd)?,
        None => run_chat(&config, None).await?,
    }

    Ok(())
}

/// Apply `--provider` / `--model` on top of the loaded configuration
fn apply_overrides(mut config: Config, cli: &Cli) -> anyhow::Result<Config> {
    if let Some(provider) = &cli.provider {
        let provider_type: ProviderType = provider.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        if provider_type.as_str() != config.provider.provider_type {
            config.provider.provider_type = provider_type.as_str().to_string();
            config.provider.api_key = None;
            config.provider.api_key_env = provider_type.api_key_env().map(str::to_string);
            config.provider.model = provider_type.default_model().to_string();
        }
    }
    if let Some(model) = &cli.model {
        config.provider.model = model.clone();
    }
    Ok(config)
}

/// Build the agent over the file-backed thread store, or print setup help
/// when no model API key is available
fn build_agent(config: &Config) -> anyhow::Result<Option<(Agent, EventReceiver)>> {
    let provider_type: ProviderType = config
        .provider
        .provider_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    if provider_type.api_key_env().is_some() && config.provider.get_api_key().is_none() {
        show_setup_instructions(provider_type);
        return Ok(None);
    }

    let store = Arc::new(FileStore::new(config.storage.threads_dir()));
    let (tx, rx) = mpsc::channel(64);
    let agent = Agent::from_config(config, store)?.with_events(tx);
    debug!(threads_dir = %config.storage.threads_dir().display(), "Agent built");
    Ok(Some((agent, rx)))
}

fn new_thread_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Run one turn with a spinner, rendering events as they arrive
async fn run_turn(
    agent: &Agent,
    events: &mut EventReceiver,
    thread_id: &str,
    prompt: &str,
) -> wayfarer_core::Result<AgentOutput> {
    let spinner = render::spinner();
    let turn = agent.ask(thread_id, prompt);
    tokio::pin!(turn);

    let result = loop {
        tokio::select! {
            result = &mut turn => break result,
            Some((_, event)) = events.recv() => render::event(&spinner, event),
        }
    };
    while let Ok((_, event)) = events.try_recv() {
        render::event(&spinner, event);
    }
    spinner.finish_and_clear();
    result
}

async fn run_ask(config: &Config, thread: Option<String>, prompt: &str) -> anyhow::Result<()> {
    let Some((agent, mut events)) = build_agent(config)? else {
        return Ok(());
    };
    let thread_id = thread.unwrap_or_else(new_thread_id);

    let output = run_turn(&agent, &mut events, &thread_id, prompt).await?;
    render::answer(&output);
    println!("{}", style(format!("Thread: {}", thread_id)).dim());
    Ok(())
}

async fn run_plan(config: &Config, thread: Option<String>, request: &TripRequest) -> anyhow::Result<()> {
    let prompt = request.to_prompt()?;
    run_ask(config, thread, &prompt).await
}

async fn run_chat(config: &Config, thread: Option<String>) -> anyhow::Result<()> {
    let Some((agent, mut events)) = build_agent(config)? else {
        return Ok(());
    };
    let mut thread_id = thread.unwrap_or_else(new_thread_id);

    println!("{}", style("Wayfarer travel planner").bold().cyan());
    println!(
        "{}",
        style("Type your request. /new starts a new thread, /thread shows the current one, /quit exits.").dim()
    );
    println!("{}", style(format!("Thread: {}", thread_id)).dim());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style("You>").bold().cyan());
        std::io::Write::flush(&mut std::io::stdout())?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                thread_id = new_thread_id();
                println!("{}", style(format!("New thread: {}", thread_id)).dim());
                continue;
            }
            "/thread" => {
                println!("{}", style(format!("Thread: {}", thread_id)).dim());
                continue;
            }
            _ => {}
        }

        match run_turn(&agent, &mut events, &thread_id, input).await {
            Ok(output) => render::answer(&output),
            Err(e) => {
                error!(thread = %thread_id, error = %e, "Turn failed");
                println!("{}", style(format!("Error: {}", e)).red());
            }
        }
    }

    Ok(())
}

fn show_tools(config: &Config) -> anyhow::Result<()> {
    let registry = create_travel_tool_registry(&config.tools)?;

    println!("{}", style("Available Tools:").bold());
    println!();

    for tool in registry.list() {
        let key_ready = match tool.name.as_str() {
            "weather_check" => config.tools.weather_key().is_some(),
            _ => config.tools.serpapi_key().is_some(),
        };
        let status = if key_ready {
            style("ready").green()
        } else {
            style("no API key").yellow()
        };
        let summary = tool.description.lines().next().unwrap_or_default();
        println!("  {:<16} {:<60} [{}]", style(&tool.name).cyan(), summary, status);
    }
    Ok(())
}

fn show_airports() {
    println!("{}", style("Airports:").bold());
    println!();
    for airport in AIRPORTS {
        println!(
            "  {}  {:<12} {}",
            style(airport.iata).cyan().bold(),
            airport.city,
            style(airport.name).dim()
        );
    }
}

fn handle_config_command(manager: ConfigManager, config: &Config, cmd: ConfigCommands) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            println!("{}", style("Configuration:").bold());
            println!();
            println!("  Config file: {}", style(manager.path().display()).dim());
            println!();
            println!("  {}", style("[provider]").bold());
            println!("  Provider:       {}", style(&config.provider.provider_type).green());
            println!("  Model:          {}", style(config.provider.effective_model()).green());
            println!("  API key:        {}", key_status(config.provider.get_api_key().is_some()));
            println!();
            println!("  {}", style("[agent]").bold());
            println!("  Max retries:    {}", config.agent.max_retries);
            println!(
                "  Max iterations: {}",
                config
                    .agent
                    .max_iterations
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unlimited".to_string())
            );
            println!("  Parallel tools: {}", config.agent.parallel_tools);
            println!("  Failure scope:  {:?}", config.agent.failure_scope);
            println!();
            println!("  {}", style("[tools]").bold());
            println!("  SerpAPI key:    {}", key_status(config.tools.serpapi_key().is_some()));
            println!("  Weather key:    {}", key_status(config.tools.weather_key().is_some()));
            println!("  Flight retries: {}", config.tools.flight_retries);
            println!("  Forecast days:  {}", config.tools.forecast_horizon_days);
            println!();
            println!("  {}", style("[storage]").bold());
            println!("  Threads dir:    {}", style(config.storage.threads_dir().display()).dim());
        }
        ConfigCommands::Setup => {
            setup::SetupWizard::new(manager).run()?;
        }
        ConfigCommands::Path => {
            println!("{}", manager.path().display());
        }
        ConfigCommands::Init => {
            if manager.path().exists() {
                println!(
                    "{}",
                    style(format!("Config already exists at {}", manager.path().display())).yellow()
                );
            } else {
                manager.save()?;
                println!(
                    "{}",
                    style(format!("Wrote default config to {}", manager.path().display())).green()
                );
            }
        }
    }
    Ok(())
}

fn key_status(configured: bool) -> console::StyledObject<&'static str> {
    if configured {
        style("configured").green()
    } else {
        style("missing").red()
    }
}

fn handle_thread_command(config: &Config, cmd: ThreadCommands) -> anyhow::Result<()> {
    let store = FileStore::new(config.storage.threads_dir());

    match cmd {
        ThreadCommands::List => {
            println!("{}", style("Saved Threads:").bold());
            println!();

            let threads = store.list()?;
            if threads.is_empty() {
                println!("  {}", style("No saved threads").dim());
            }
            for conversation in &threads {
                render::thread_summary(conversation);
            }
        }
        ThreadCommands::Show { id } => match store.load(&id)? {
            Some(conversation) => render::transcript(&conversation),
            None => println!("{}", style(format!("Thread '{}' not found", id)).red()),
        },
        ThreadCommands::Delete { id } => {
            if store.delete(&id)? {
                println!("{}", style(format!("Thread '{}' deleted", id)).green());
            } else {
                println!("{}", style(format!("Thread '{}' not found", id)).red());
            }
        }
    }
    Ok(())
}

/// Show setup instructions when no API key is configured
fn show_setup_instructions(provider_type: ProviderType) {
    println!("{}", style("Welcome to Wayfarer!").bold().cyan());
    println!();
    println!("{}", style("Setup Required").bold().yellow());
    println!("No API key configured for {}.", provider_type);
    println!();

    let env_var = provider_type.api_key_env().unwrap_or("API_KEY");

    println!("{}", style("Option 1: Guided setup").bold());
    println!("  {}", style("wayfarer config setup").cyan());
    println!();

    println!("{}", style("Option 2: Environment Variable (Quick)").bold());
    println!("  export {}=\"your-api-key-here\"", style(env_var).cyan());
    println!();

    println!("{}", style("Option 3: Config File (Persistent)").bold());
    let config_path = ConfigManager::default_config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "~/.config/wayfarer/config.toml".to_string());
    println!("  Edit: {}", style(&config_path).cyan());
    println!();
    println!("  Example config:");
    println!("  {}", style("─".repeat(50)).dim());
    println!(
        r#"  [provider]
  provider_type = "{}"
  model = "{}"
  api_key = "your-api-key-here"

  [tools]
  serpapi_api_key = "your-serpapi-key"
  weather_api_key = "your-weatherapi-key""#,
        provider_type,
        provider_type.default_model()
    );
    println!("  {}", style("─".repeat(50)).dim());
    println!();

    println!("{}", style("After configuring, run 'wayfarer' again to start.").dim());
    println!();
    println!("For more help: {}", style("wayfarer --help").cyan());
}
