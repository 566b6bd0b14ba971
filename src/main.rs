use std::sync::Arc;
use clap::{Parser, Subcommand};
use tracing_subscriber;

use cogbot::application::messaging::MessageParser;
use cogbot::application::services::CommandService;
use cogbot::cogs::{builtin, ExternalNamespace, PackageLoader, PackageRegistry};
use cogbot::domain::traits::Bot;
use cogbot::infrastructure::adapters::console::ConsoleAdapter;
use cogbot::infrastructure::config::Config;

#[derive(Parser)]
#[command(name = "cogbot")]
#[command(about = "A chat bot built from hot-swappable cog packages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
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
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Run => {
            run_bot(&cli.config);
        }
        Commands::Version => {
            println!("cogbot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn run_bot(config_path: &str) {
    let config = Config::resolve(config_path);
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Starting cogbot: {}", config.bot.name);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async {
        let loader = Arc::new(build_loader(&config));
        tracing::info!(
            "Package namespaces: {}",
            loader.namespaces().collect::<Vec<_>>().join(" > ")
        );
        for name in &config.packages.load_on_startup {
            if let Err(e) = loader.load(name).await {
                tracing::error!("Failed to load startup package {}: {}", name, e);
            }
        }
        tracing::info!("{} cog package(s) loaded", loader.loaded().await.len());

        let commands = CommandService::new(&config.bot.prefix, loader.clone())
            .with_owners(config.bot.owners.iter().cloned());

        match &config.adapters.console {
            Some(console) if console.enabled => {
                let bot = ConsoleAdapter::new(&config.bot.name, &console.user_id);
                run_console_bot(&bot, &commands).await;
            }
            _ => tracing::warn!("No adapter enabled, nothing to do"),
        }

        loader.unload_all().await;
    });

    tracing::info!("Bye");
}

/// External namespace first so installed packages shadow bundled ones
fn build_loader(config: &Config) -> PackageLoader {
    PackageLoader::new(PackageRegistry::new().with_reserved(CommandService::core_command_names()))
        .with_namespace(ExternalNamespace::new(
            &config.packages.external_namespace,
            &config.packages.external_dir,
        ))
        .with_namespace(builtin::namespace(&config.packages.builtin_namespace))
}

async fn run_console_bot(bot: &ConsoleAdapter, commands: &CommandService) {
    if let Err(e) = bot.start().await {
        tracing::error!("Failed to start bot: {}", e);
        return;
    }

    let info = bot.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let parser = MessageParser::new(commands.prefix()).when_mentioned(&info.id);

    while let Some(input) = bot.read_line().await {
        if input.is_empty() {
            continue;
        }

        let msg = parser
            .parse("console", input, Some(bot.user().clone()))
            .with_platform("console");
        if let Some(reply) = commands.respond(&msg).await {
            if let Err(e) = bot.send_message(&msg.chat_id, &reply).await {
                tracing::error!("Failed to send reply: {}", e);
            }
        }

        if commands.shutdown_requested() {
            break;
        }
    }

    if let Err(e) = bot.close().await {
        tracing::warn!("Failed to close bot: {}", e);
    }
}

fn init_config() {
    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => tracing::error!("Failed to render config: {}", e),
    }
}
