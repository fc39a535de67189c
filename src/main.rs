use clap::{Parser, Subcommand};
use std::sync::Arc;

use sleep_bot::application::errors::BotError;
use sleep_bot::application::messaging::MessageDispatcher;
use sleep_bot::application::services::{MessageService, SleepTracker, TrackerSettings};
use sleep_bot::domain::traits::{Bot, LocalClock};
use sleep_bot::infrastructure::adapters::{ConsoleAdapter, TelegramAdapter};
use sleep_bot::infrastructure::config::Config;
use sleep_bot::infrastructure::database::Database;

#[derive(Parser)]
#[command(name = "sleep-bot")]
#[command(about = "A chat bot that tracks sleep", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_bot(&cli.config, cli.token),
        Commands::Version => {
            println!("sleep-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(config_path: &str, token_override: Option<String>) -> Config {
    let mut config = if std::path::Path::new(config_path).exists() {
        Config::load(config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    if let Some(token) = token_override {
        if let Some(ref mut tg) = config.adapters.telegram {
            tg.token = Some(token);
            tg.enabled = true;
        }
    }
    config
}

fn run_bot(config_path: &str, token_override: Option<String>) -> Result<(), BotError> {
    let config = load_config(config_path, token_override);
    tracing::info!("Starting {}", config.bot.name);

    let db = Database::new(&config.database.path)?;
    tracing::info!("Database initialized at {}", config.database.path.display());

    let tracker = SleepTracker::new(
        Arc::new(db),
        Arc::new(LocalClock),
        TrackerSettings::from(&config.tracker),
    );
    let dispatcher = MessageDispatcher::new(&config.bot.prefix, tracker);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))?;

    if let Some(token) = config.telegram_token() {
        let timeout = config
            .adapters
            .telegram
            .as_ref()
            .map(|t| t.poll_timeout_secs)
            .unwrap_or(30);
        let mut service = MessageService::new(TelegramAdapter::new(token), dispatcher);
        rt.block_on(run_telegram_bot(&mut service, timeout))
    } else {
        let console = config.adapters.console.clone().unwrap_or_default();
        if !console.enabled {
            return Err(BotError::Internal(
                "No adapter enabled: set a Telegram token or enable the console adapter".to_string(),
            ));
        }
        rt.block_on(async {
            let service = MessageService::new(
                ConsoleAdapter::new(console.user_id, console.user_name),
                dispatcher,
            );
            run_console_bot(service).await
        })
    }
}

async fn run_telegram_bot(
    service: &mut MessageService<TelegramAdapter>,
    timeout_seconds: u64,
) -> Result<(), BotError> {
    // Fetch bot info
    service.bot_mut().fetch_bot_info().await?;

    // Register bot commands with Telegram
    if let Err(e) = service.bot().register_commands().await {
        tracing::warn!("Failed to register commands: {}", e);
    }

    service.bot().start().await?;
    let info = service.bot().bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let mut offset: i64 = 0;
    tracing::info!("Starting message loop...");

    loop {
        match service.bot().get_updates(offset, timeout_seconds).await {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::debug!("Received {} updates", updates.len());
                }
                for update in &updates {
                    let Some(message) = TelegramAdapter::to_message(update, service.dispatcher().parser()) else {
                        continue;
                    };
                    let chat_id = message.chat_id.clone();
                    if let Err(e) = service.process(message).await {
                        tracing::error!("[{}] Failed to deliver replies: {}", chat_id, e);
                    }
                }

                // Update offset
                offset = TelegramAdapter::get_next_offset(&updates, offset);
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
            }
        }
    }
}

async fn run_console_bot(service: MessageService<ConsoleAdapter>) -> Result<(), BotError> {
    service.bot().start().await?;

    let info = service.bot().bot_info();
    tracing::info!("Bot started: @{}", info.username);

    while let Some(input) = service.bot().read_line("> ").await {
        if input.is_empty() {
            continue;
        }

        let sender = service.bot().sender().clone();
        let message = service
            .dispatcher()
            .parser()
            .parse("console", &input, Some(sender))
            .with_platform("console");
        if let Err(e) = service.process(message).await {
            tracing::error!("Failed to deliver replies: {}", e);
        }
    }

    tracing::info!("Console input closed, shutting down");
    Ok(())
}

fn init_config() -> Result<(), BotError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
