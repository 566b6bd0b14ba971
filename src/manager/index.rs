//! Installed-cog index (`installed_cogs.json`): cog name -> repository name

use std::collections::BTreeMap;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::application::errors::RepoError;

/// Provenance of every installed cog.
///
/// Read in full and rewritten in full on each mutation; no locking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstalledCogs {
    entries: BTreeMap<String, String>,
}

impl InstalledCogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index at `path`; empty when the file does not exist yet
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RepoError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn insert(&mut self, cog: impl Into<String>, repo: impl Into<String>) -> Option<String> {
        self.entries.insert(cog.into(), repo.into())
    }

    pub fn remove(&mut self, cog: &str) -> Option<String> {
        self.entries.remove(cog)
    }

    pub fn repo_of(&self, cog: &str) -> Option<&str> {
        self.entries.get(cog).map(String::as_str)
    }

    pub fn contains(&self, cog: &str) -> bool {
        self.entries.contains_key(cog)
    }

    /// `(cog, repo)` pairs in cog name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, r)| (c.as_str(), r.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = InstalledCogs::load(dir.path().join("installed_cogs.json")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_reads_flat_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed_cogs.json");
        std::fs::write(&path, r#"{"foo": "repoA", "bar": "repoB"}"#).unwrap();

        let index = InstalledCogs::load(&path).unwrap();
        assert_eq!(index.repo_of("foo"), Some("repoA"));
        assert_eq!(index.iter().map(|(c, _)| c).collect::<Vec<_>>(), vec!["bar", "foo"]);
    }

    #[test]
    fn test_corrupt_index_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed_cogs.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(InstalledCogs::load(&path), Err(RepoError::Index(_))));
    }
}
