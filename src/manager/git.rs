//! Version control backend - `git` invoked as a subprocess

use std::path::{Path, PathBuf};
use std::process::Command;
use crate::application::errors::RepoError;

/// Operations the repository manager needs from version control
pub trait Vcs {
    /// Clone `url` into `dest`
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), RepoError>;

    /// Download new objects from the upstream remote
    fn fetch(&self, repo: &Path) -> Result<(), RepoError>;

    /// Hard-reset the working copy to its upstream tracking branch
    fn reset_to_upstream(&self, repo: &Path) -> Result<(), RepoError>;

    /// Fetch, then reset
    fn update(&self, repo: &Path) -> Result<(), RepoError> {
        self.fetch(repo)?;
        self.reset_to_upstream(repo)
    }
}

/// Runs the `git` executable; its output goes straight to the terminal
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<(), RepoError> {
        let mut command = Command::new(&self.program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        tracing::debug!("Running git {}", args.join(" "));
        let status = command.status()?;
        if status.success() {
            Ok(())
        } else {
            Err(RepoError::Git {
                command: args.first().copied().unwrap_or_default().to_string(),
                code: status.code(),
            })
        }
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl Vcs for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), RepoError> {
        let dest = dest.to_string_lossy();
        self.run(&["clone", url, dest.as_ref()], None)
    }

    fn fetch(&self, repo: &Path) -> Result<(), RepoError> {
        self.run(&["fetch"], Some(repo))
    }

    fn reset_to_upstream(&self, repo: &Path) -> Result<(), RepoError> {
        self.run(&["reset", "--hard", "@{upstream}"], Some(repo))
    }
}
