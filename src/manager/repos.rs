//! Repository manager - git working copies and the cogs installed from them

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use crate::application::errors::RepoError;
use crate::cogs::external::package_name_of;
use crate::infrastructure::config::Config;
use super::fs::{copy_tree, remove_tree};
use super::git::Vcs;
use super::index::InstalledCogs;
use super::naming::{candidate_name, is_valid_cog_name, is_valid_repo_name};

/// Where repositories, installed cogs and the index live
#[derive(Debug, Clone)]
pub struct Layout {
    pub repos_dir: PathBuf,
    pub install_dir: PathBuf,
    pub index_path: PathBuf,
}

impl Layout {
    pub fn new(repos_dir: impl Into<PathBuf>, install_dir: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            repos_dir: repos_dir.into(),
            install_dir: install_dir.into(),
            index_path: index_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.manager.repos_dir,
            &config.packages.external_dir,
            &config.manager.index_path,
        )
    }

    pub fn repo_path(&self, repo: &str) -> PathBuf {
        self.repos_dir.join(repo)
    }

    pub fn cog_path(&self, repo: &str, cog: &str) -> PathBuf {
        self.repos_dir.join(repo).join(cog)
    }

    pub fn installed_path(&self, cog: &str) -> PathBuf {
        self.install_dir.join(cog)
    }
}

/// Outcome of [`RepoManager::update_cogs`]
#[derive(Debug, Default)]
pub struct CogUpdateReport {
    /// Cogs whose files were refreshed
    pub updated: Vec<String>,
    /// Repositories that failed to update; their cogs were left untouched
    pub failed_repos: BTreeSet<String>,
    /// Cogs that could not be re-copied from an updated repository
    pub failed_cogs: Vec<(String, RepoError)>,
}

impl CogUpdateReport {
    /// Final line listing the skipped repositories, if any
    pub fn summary(&self) -> Option<String> {
        if self.failed_repos.is_empty() {
            return None;
        }
        let names: Vec<&str> = self.failed_repos.iter().map(String::as_str).collect();
        Some(format!(
            "Some repositories (and cogs installed from them) failed to update: {}",
            names.join(", ")
        ))
    }
}

/// Clones, updates and removes repositories and installs cogs from them
pub struct RepoManager<V: Vcs> {
    layout: Layout,
    vcs: V,
}

impl<V: Vcs> RepoManager<V> {
    pub fn new(layout: Layout, vcs: V) -> Self {
        Self { layout, vcs }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    pub fn repo_exists(&self, repo: &str) -> bool {
        is_valid_repo_name(repo) && self.layout.repo_path(repo).is_dir()
    }

    /// Name derived from `url` when it is valid and still free
    pub fn suggest_name(&self, url: &str) -> Option<String> {
        candidate_name(url).filter(|name| self.check_name(name).is_ok())
    }

    /// Whether `name` may be used for a new repository
    pub fn check_name(&self, name: &str) -> Result<(), RepoError> {
        if !is_valid_repo_name(name) {
            return Err(RepoError::InvalidName(name.to_string()));
        }
        if self.layout.repo_path(name).exists() {
            return Err(RepoError::NameTaken(name.to_string()));
        }
        Ok(())
    }

    /// Clone `url` as `repos/<name>`
    pub fn add_repository(&self, url: &str, name: &str) -> Result<PathBuf, RepoError> {
        self.check_name(name)?;
        fs::create_dir_all(&self.layout.repos_dir)?;

        let path = self.layout.repo_path(name);
        self.vcs.clone_repo(url, &path)?;
        info!("Added repository {} from {}", name, url);
        Ok(path)
    }

    pub fn remove_repository(&self, name: &str) -> Result<(), RepoError> {
        if !self.repo_exists(name) {
            return Err(RepoError::RepoNotFound(name.to_string()));
        }
        remove_tree(&self.layout.repo_path(name))?;
        info!("Removed repository {}", name);
        Ok(())
    }

    pub fn list_repositories(&self) -> Result<Vec<String>, RepoError> {
        if !self.layout.repos_dir.exists() {
            return Ok(Vec::new());
        }
        list_entries(&self.layout.repos_dir, true)
    }

    /// Entries of a repository that can be installed as cogs
    pub fn list_cogs(&self, repo: &str) -> Result<Vec<String>, RepoError> {
        if !self.repo_exists(repo) {
            return Err(RepoError::RepoNotFound(repo.to_string()));
        }
        list_entries(&self.layout.repo_path(repo), false)
    }

    pub fn update_repository(&self, repo: &str) -> Result<(), RepoError> {
        if !self.repo_exists(repo) {
            return Err(RepoError::RepoNotFound(repo.to_string()));
        }
        self.vcs.update(&self.layout.repo_path(repo))
    }

    /// Update every repository; one failure does not stop the rest
    pub fn update_repositories(&self) -> Result<Vec<(String, Result<(), RepoError>)>, RepoError> {
        let results = self
            .list_repositories()?
            .into_iter()
            .map(|repo| {
                let result = self.update_repository(&repo);
                if let Err(e) = &result {
                    warn!("Repository {} failed to update: {}", repo, e);
                }
                (repo, result)
            })
            .collect();
        Ok(results)
    }

    pub fn installed(&self) -> Result<InstalledCogs, RepoError> {
        InstalledCogs::load(&self.layout.index_path)
    }

    /// Copy `repos/<repo>/<cog>` into the install directory and record it
    pub fn install_cog(&self, repo: &str, cog: &str) -> Result<(), RepoError> {
        if !self.repo_exists(repo) {
            return Err(RepoError::RepoNotFound(repo.to_string()));
        }
        let source = self.layout.cog_path(repo, cog);
        if !is_valid_cog_name(cog) || !source.exists() {
            return Err(RepoError::CogNotFound(cog.to_string()));
        }

        if package_name_of(cog, source.is_dir()).is_none() {
            return Err(RepoError::Unloadable(cog.to_string()));
        }

        let target = self.layout.installed_path(cog);
        let mut installed = self.installed()?;
        if target.exists() || installed.contains(cog) {
            return Err(RepoError::AlreadyInstalled(cog.to_string()));
        }

        installed.insert(cog, repo);
        copy_tree(&source, &target)?;
        installed.save(&self.layout.index_path)?;
        info!("Installed cog {} from {}", cog, repo);
        Ok(())
    }

    pub fn uninstall_cog(&self, cog: &str) -> Result<(), RepoError> {
        if !is_valid_cog_name(cog) {
            return Err(RepoError::NotInstalled(cog.to_string()));
        }
        let target = self.layout.installed_path(cog);
        let mut installed = self.installed()?;
        let on_disk = fs::symlink_metadata(&target).is_ok();
        if !on_disk && !installed.contains(cog) {
            return Err(RepoError::NotInstalled(cog.to_string()));
        }

        if on_disk {
            remove_tree(&target)?;
        }
        installed.remove(cog);
        installed.save(&self.layout.index_path)?;
        info!("Uninstalled cog {}", cog);
        Ok(())
    }

    /// Refresh every installed cog from its repository.
    ///
    /// Each repository is updated at most once; cogs of a repository whose
    /// update failed are skipped. The index is not rewritten since no
    /// cog changes its repository.
    pub fn update_cogs(&self) -> Result<CogUpdateReport, RepoError> {
        let installed = self.installed()?;
        let mut updated_repos = BTreeSet::new();
        let mut report = CogUpdateReport::default();

        for (cog, repo) in installed.iter() {
            if report.failed_repos.contains(repo) {
                continue;
            }
            if !updated_repos.contains(repo) {
                match self.update_repository(repo) {
                    Ok(()) => {
                        updated_repos.insert(repo.to_string());
                    }
                    Err(e) => {
                        warn!("Repository {} failed to update: {}", repo, e);
                        report.failed_repos.insert(repo.to_string());
                        continue;
                    }
                }
            }

            let source = self.layout.cog_path(repo, cog);
            if !source.exists() {
                report.failed_cogs.push((cog.to_string(), RepoError::CogNotFound(cog.to_string())));
                continue;
            }
            match copy_tree(&source, &self.layout.installed_path(cog)) {
                Ok(()) => report.updated.push(cog.to_string()),
                Err(e) => report.failed_cogs.push((cog.to_string(), e.into())),
            }
        }

        Ok(report)
    }
}

/// Sorted names of the visible entries of `dir`, optionally directories only
fn list_entries(dir: &Path, dirs_only: bool) -> Result<Vec<String>, RepoError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if dirs_only && !entry.path().is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}
