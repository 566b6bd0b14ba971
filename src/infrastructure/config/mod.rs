//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub packages: PackagesConfig,
    pub manager: ManagerConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
    /// User ids allowed to run owner-only commands
    pub owners: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackagesConfig {
    /// Label of the namespace for installed packages, consulted first
    pub external_namespace: String,
    pub external_dir: PathBuf,
    /// Label of the namespace for bundled packages
    pub builtin_namespace: String,
    pub load_on_startup: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManagerConfig {
    pub repos_dir: PathBuf,
    pub index_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Identity of whoever types into the console
    pub user_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "cogbot".to_string(),
                prefix: "===".to_string(),
                owners: vec!["console".to_string()],
            },
            packages: PackagesConfig {
                external_namespace: "ext_cogs".to_string(),
                external_dir: PathBuf::from("ext_cogs"),
                builtin_namespace: "cogs".to_string(),
                load_on_startup: Vec::new(),
            },
            manager: ManagerConfig {
                repos_dir: PathBuf::from("repos"),
                index_path: PathBuf::from("installed_cogs.json"),
            },
            adapters: AdaptersConfig {
                console: Some(ConsoleConfig {
                    enabled: true,
                    user_id: "console".to_string(),
                }),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Config file if it exists, defaults otherwise; environment overrides on top
    pub fn resolve(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Config::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            })
        } else {
            Config::default()
        };
        config.apply_env();
        config
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Apply `COGBOT_*` environment overrides (a `.env` file is read first)
    pub fn apply_env(&mut self) {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        if let Ok(prefix) = std::env::var("COGBOT_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Ok(owners) = std::env::var("COGBOT_OWNERS") {
            self.bot.owners = split_list(&owners);
        }

        if let Ok(startup) = std::env::var("COGBOT_LOAD_ON_STARTUP") {
            self.packages.load_on_startup = split_list(&startup);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.packages.external_namespace == self.packages.builtin_namespace {
            return Err(ConfigError::InvalidValue(format!(
                "external and built-in namespaces must differ (both '{}')",
                self.packages.builtin_namespace
            )));
        }
        Ok(())
    }
}

/// Comma separated list, blanks dropped
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
