//! Package registry - Tracks active packages and the commands they own

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use crate::application::errors::CogError;
use crate::domain::entities::Command;
use super::external::ShadowLibrary;
use super::{Cog, Package};

/// An activated package
pub struct LoadedPackage {
    qualified: String,
    origin: String,
    commands: Vec<Command>,
    // Declared before `_library` so the cog is dropped while its code is still mapped
    cog: Arc<dyn Cog>,
    _library: Option<ShadowLibrary>,
}

impl LoadedPackage {
    pub fn new(qualified: impl Into<String>, package: Package, commands: Vec<Command>) -> Self {
        Self {
            qualified: qualified.into(),
            origin: package.origin,
            commands,
            cog: package.cog,
            _library: package.library,
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn cog(&self) -> &dyn Cog {
        self.cog.as_ref()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// Summary of an active package for listings
#[derive(Debug, Clone, serde::Serialize)]
pub struct PackageInfo {
    pub qualified_name: String,
    pub cog: String,
    pub origin: String,
    pub commands: Vec<String>,
}

/// Registry of active packages, owned by the loader
#[derive(Default)]
pub struct PackageRegistry {
    packages: BTreeMap<String, Arc<LoadedPackage>>,
    /// Lowercased command name or alias -> qualified package name
    commands: HashMap<String, String>,
    reserved: HashSet<String>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command names no package may register (the bot's own commands)
    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reserved
            .extend(names.into_iter().map(|n| n.as_ref().to_lowercase()));
        self
    }

    pub fn contains(&self, qualified: &str) -> bool {
        self.packages.contains_key(qualified)
    }

    /// Verify `commands` can be registered for the package `qualified`
    pub fn check_commands(&self, qualified: &str, commands: &[Command]) -> Result<(), CogError> {
        let mut seen = HashSet::new();
        for name in commands.iter().flat_map(|c| c.names()) {
            let key = name.to_lowercase();
            if self.reserved.contains(&key) {
                return Err(CogError::Registration(format!(
                    "command '{}' is reserved by the bot",
                    name
                )));
            }
            if let Some(owner) = self.commands.get(&key) {
                if owner != qualified {
                    return Err(CogError::Registration(format!(
                        "command '{}' is already registered by {}",
                        name, owner
                    )));
                }
            }
            if !seen.insert(key) {
                return Err(CogError::Registration(format!(
                    "command '{}' is declared twice",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Add a package; callers run [`check_commands`](Self::check_commands) first
    pub fn insert(&mut self, package: Arc<LoadedPackage>) {
        for name in package.commands().iter().flat_map(|c| c.names()) {
            self.commands
                .insert(name.to_lowercase(), package.qualified_name().to_string());
        }
        tracing::debug!(
            "Registered {} with {} command(s)",
            package.qualified_name(),
            package.commands().len()
        );
        self.packages
            .insert(package.qualified_name().to_string(), package);
    }

    pub fn remove(&mut self, qualified: &str) -> Option<Arc<LoadedPackage>> {
        let package = self.packages.remove(qualified)?;
        self.commands.retain(|_, owner| owner != qualified);
        Some(package)
    }

    pub fn get(&self, qualified: &str) -> Option<Arc<LoadedPackage>> {
        self.packages.get(qualified).cloned()
    }

    /// Package owning the command `name` together with its declaration
    pub fn find_command(&self, name: &str) -> Option<(Arc<LoadedPackage>, Command)> {
        let qualified = self.commands.get(&name.to_lowercase())?;
        let package = self.packages.get(qualified)?;
        let command = package.commands().iter().find(|c| c.matches(name))?.clone();
        Some((package.clone(), command))
    }

    pub fn names(&self) -> Vec<String> {
        self.packages.keys().cloned().collect()
    }

    pub fn info(&self) -> Vec<PackageInfo> {
        self.packages
            .values()
            .map(|p| PackageInfo {
                qualified_name: p.qualified_name().to_string(),
                cog: p.cog().name().to_string(),
                origin: p.origin().to_string(),
                commands: p.commands().iter().map(|c| c.name.clone()).collect(),
            })
            .collect()
    }

    /// Drain every package, for shutdown
    pub fn drain(&mut self) -> Vec<Arc<LoadedPackage>> {
        self.commands.clear();
        std::mem::take(&mut self.packages).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
