use std::io;
use clap::{Parser, Subcommand};
use tracing_subscriber;

use cogbot::infrastructure::config::Config;
use cogbot::manager::{Console, GitCli, Layout, RepoManager};

#[derive(Parser)]
#[command(name = "cog-manager")]
#[command(about = "Install cogs for cogbot from git repositories", long_about = None)]
struct Cli {
    /// Without a command, an interactive menu is shown
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a cog from a repository
    Install { repo: String, cog: String },
    /// Uninstall a cog
    Uninstall { cog: String },
    /// Update every installed cog from its repository
    UpdateCogs,
    /// List cogs in a repository
    ListCogs { repo: String },
    /// List repositories
    ListRepos,
    /// Update every repository
    UpdateRepos,
    /// Clone a repository
    AddRepo {
        url: String,
        /// Name to clone as; derived from the address when omitted
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Remove a repository
    RemoveRepo { repo: String },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.into()),
        )
        .init();

    let config = Config::resolve(&cli.config);
    let manager = RepoManager::new(Layout::from_config(&config), GitCli::new());

    let stdin = io::stdin();
    let mut console = Console::new(&manager, stdin.lock(), io::stdout());

    let result = match cli.command {
        None => console.run().map(|()| true),
        Some(Commands::Install { repo, cog }) => console.install_cog(&repo, &cog),
        Some(Commands::Uninstall { cog }) => console.uninstall_cog(&cog),
        Some(Commands::UpdateCogs) => console.update_cogs(),
        Some(Commands::ListCogs { repo }) => console.list_cogs(&repo),
        Some(Commands::ListRepos) => console.list_repositories(),
        Some(Commands::UpdateRepos) => console.update_repositories(),
        Some(Commands::AddRepo { url, name }) => console.add_repository(&url, name.as_deref()),
        Some(Commands::RemoveRepo { repo }) => console.remove_repository(&repo),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("Console I/O failed: {}", e);
            std::process::exit(1);
        }
    }
}
