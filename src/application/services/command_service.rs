use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use crate::application::errors::{CommandError, PackageError};
use crate::cogs::{Context, PackageLoader};
use crate::domain::entities::{Check, Command, CommandRegistry, Content, Message};
use super::replies::{self, Reply, Verb};

/// Service for dispatching commands to the bot's own handlers and to loaded cogs
pub struct CommandService {
    registry: CommandRegistry,
    prefix: String,
    owners: HashSet<String>,
    loader: Arc<PackageLoader>,
    shutdown: AtomicBool,
}

impl CommandService {
    pub fn new(prefix: impl Into<String>, loader: Arc<PackageLoader>) -> Self {
        let mut registry = CommandRegistry::new();
        for command in Self::core_commands() {
            registry.register(command);
        }

        Self {
            registry,
            prefix: prefix.into(),
            owners: HashSet::new(),
            loader,
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn with_owners<I, S>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owners.extend(owners.into_iter().map(Into::into));
        self
    }

    /// Commands the bot provides itself; packages may not register these names
    pub fn core_commands() -> Vec<Command> {
        vec![
            Command::new("load")
                .with_description("Load a cog package")
                .with_usage("load <name>")
                .owner_only(),
            Command::new("unload")
                .with_description("Unload a cog package")
                .with_usage("unload <name>")
                .owner_only(),
            Command::new("reload")
                .with_description("Reload a cog package")
                .with_usage("reload <name>")
                .owner_only(),
            Command::new("packages")
                .with_description("List loaded cog packages")
                .owner_only(),
            Command::new("shutdown")
                .with_description("Shut the bot down")
                .owner_only(),
            Command::new("ping").with_description("Check the bot is alive"),
            Command::new("help")
                .with_description("Show help message")
                .with_usage("help [command]"),
        ]
    }

    /// Every name and alias of [`core_commands`](Self::core_commands), reserved in the package registry
    pub fn core_command_names() -> Vec<String> {
        Self::core_commands()
            .iter()
            .flat_map(|c| c.names().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn loader(&self) -> &Arc<PackageLoader> {
        &self.loader
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Run the command in `message`; `Ok(None)` when there is nothing to reply
    pub async fn handle(&self, message: &Message) -> Result<Option<String>, CommandError> {
        let Content::Command { name, .. } = &message.content else {
            return Ok(None);
        };
        if message.sender.as_ref().is_some_and(|u| u.is_bot) {
            return Ok(None);
        }

        if let Some(cmd) = self.registry.find(name) {
            self.run_checks(cmd, message)?;
            return self.run_core(&cmd.name, message).await;
        }

        let (package, cmd) = self
            .loader
            .find_command(name)
            .await
            .ok_or_else(|| CommandError::NotFound(name.clone()))?;
        self.run_checks(&cmd, message)?;

        debug!("Dispatching {} to {}", cmd.name, package.qualified_name());
        let ctx = Context::new(message.clone(), self.prefix.as_str());
        package.cog().invoke(&cmd.name, &ctx).await
    }

    /// Like [`handle`](Self::handle), with errors turned into replies through the reply table
    pub async fn respond(&self, message: &Message) -> Option<String> {
        let error = match self.handle(message).await {
            Ok(reply) => return reply,
            Err(e) => e,
        };

        match replies::command_reply(&error) {
            Reply::Text(text) => Some(text),
            Reply::Help => {
                let Content::Command { name, .. } = &message.content else {
                    return None;
                };
                Some(self.help(Some(name)).await)
            }
            Reply::Silent => {
                match &error {
                    CommandError::NotFound(name) => debug!("Unknown command: {}", name),
                    CommandError::CheckFailed(_) => {
                        warn!("{} (user {})", error, message.sender_id().unwrap_or("unknown"))
                    }
                    _ => error!("{}", error),
                }
                None
            }
        }
    }

    /// Help for one command, or the list of every command
    pub async fn help(&self, command: Option<&str>) -> String {
        if let Some(name) = command {
            if let Some(cmd) = self.registry.find(name) {
                return cmd.help(&self.prefix);
            }
            if let Some((_, cmd)) = self.loader.find_command(name).await {
                return cmd.help(&self.prefix);
            }
            return format!("Command {}{} not found", self.prefix, name);
        }

        let mut help = "Available commands:\n".to_string();
        let cog_commands = self.loader.commands().await;
        for cmd in self.registry.all().chain(cog_commands.iter()) {
            help.push_str(&format!(
                "  {}{} - {}\n",
                self.prefix,
                cmd.name,
                cmd.description.as_deref().unwrap_or("")
            ));
        }
        help
    }

    fn run_checks(&self, command: &Command, message: &Message) -> Result<(), CommandError> {
        for check in &command.checks {
            let passed = match check {
                Check::Owner => message
                    .sender_id()
                    .is_some_and(|id| self.owners.contains(id)),
            };
            if !passed {
                return Err(CommandError::CheckFailed(format!(
                    "{:?} check failed for {}",
                    check, command.name
                )));
            }
        }
        Ok(())
    }

    async fn run_core(&self, name: &str, message: &Message) -> Result<Option<String>, CommandError> {
        let reply = match name {
            "load" => self.package_op(Verb::Load, message).await?,
            "reload" => self.package_op(Verb::Reload, message).await?,
            "unload" => self.package_op(Verb::Unload, message).await?,
            "packages" => {
                let loaded = self.loader.loaded().await;
                if loaded.is_empty() {
                    "No cog packages loaded.".to_string()
                } else {
                    let lines: Vec<String> = loaded
                        .iter()
                        .map(|p| format!("- {} ({})", p.qualified_name, p.origin))
                        .collect();
                    format!("Loaded cog packages:\n{}", lines.join("\n"))
                }
            }
            "shutdown" => {
                info!("Shutting down...");
                self.shutdown.store(true, Ordering::SeqCst);
                "Shutting down...".to_string()
            }
            "ping" => "Pong!".to_string(),
            "help" => self.help(message.args().first().map(String::as_str)).await,
            other => return Err(CommandError::NotFound(other.to_string())),
        };
        Ok(Some(reply))
    }

    async fn package_op(&self, verb: Verb, message: &Message) -> Result<String, CommandError> {
        let name = message
            .args()
            .first()
            .ok_or_else(|| CommandError::MissingArgument("name".to_string()))?;

        let result = match verb {
            Verb::Load => self.loader.load(name).await,
            Verb::Reload => self.loader.reload(name).await,
            Verb::Unload => self.loader.unload(name).await,
        };

        Ok(match result {
            Ok(_) => replies::package_success(name, verb),
            Err(e) => {
                if let PackageError::Failed { source, .. } = &e {
                    error!(
                        "Cog package with name `{}` couldn't be {}: {}",
                        name,
                        verb.past(),
                        cause_chain(&**source)
                    );
                }
                replies::package_reply(&e, name, verb)
            }
        })
    }
}

/// `error: cause: cause...` for logging
fn cause_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = error.to_string();
    let mut current = error.source();
    while let Some(cause) = current {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        current = cause.source();
    }
    chain
}
