//! Application layer errors

use thiserror::Error;

/// Boxed cause carried by load failures
pub type Cause = Box<dyn std::error::Error + Send + Sync>;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// `None` when the converter had nothing better to say than "invalid"
    #[error("Bad argument: {}", .0.as_deref().unwrap_or("invalid value"))]
    BadArgument(Option<String>),

    #[error("Check failed: {0}")]
    CheckFailed(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Package loader errors
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Package '{0}' could not be found")]
    NotFound(String),

    #[error("Package '{0}' is already loaded")]
    AlreadyLoaded(String),

    #[error("Package '{0}' has not been loaded")]
    NotLoaded(String),

    #[error("Package '{0}' has no setup entry point")]
    EntryPointMissing(String),

    #[error("Package '{name}' raised an error: {source}")]
    Failed {
        name: String,
        #[source]
        source: Cause,
    },
}

/// Discriminant of [`PackageError`], used by the reply table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageErrorKind {
    NotFound,
    AlreadyLoaded,
    NotLoaded,
    EntryPointMissing,
    Failed,
}

impl PackageError {
    pub fn failed(name: impl Into<String>, source: impl Into<Cause>) -> Self {
        PackageError::Failed {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> PackageErrorKind {
        match self {
            PackageError::NotFound(_) => PackageErrorKind::NotFound,
            PackageError::AlreadyLoaded(_) => PackageErrorKind::AlreadyLoaded,
            PackageError::NotLoaded(_) => PackageErrorKind::NotLoaded,
            PackageError::EntryPointMissing(_) => PackageErrorKind::EntryPointMissing,
            PackageError::Failed { .. } => PackageErrorKind::Failed,
        }
    }
}

/// Errors raised by a cog's own code
#[derive(Error, Debug)]
pub enum CogError {
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Command registration failed: {0}")]
    Registration(String),
}

/// Repository manager errors
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Repository with this name does not exist!")]
    RepoNotFound(String),

    #[error("Cog with this name does not exist!")]
    CogNotFound(String),

    #[error("Cog with this name is already installed!")]
    AlreadyInstalled(String),

    #[error("Cog with this name is not installed!")]
    NotInstalled(String),

    #[error("Cog with this name can't be loaded by the bot! Names may only contain characters A-z, numbers, underscores, and hyphens.")]
    Unloadable(String),

    #[error(
        "Repo names can only contain characters A-z, numbers, underscores, hyphens, and dots."
    )]
    InvalidName(String),

    #[error("This name is already taken!")]
    NameTaken(String),

    #[error("git {command} returned exit code {}", .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    Git { command: String, code: Option<i32> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Installed cogs index is corrupt: {0}")]
    Index(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
