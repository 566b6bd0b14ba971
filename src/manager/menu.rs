//! Interactive front end of the repository manager

use std::fmt;
use std::io::{self, BufRead, Write};
use crate::application::errors::RepoError;
use super::git::Vcs;
use super::repos::RepoManager;

/// Entries of the numbered menu, in display order after `0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Exit,
    InstallCog,
    UninstallCog,
    UpdateCogs,
    ListCogs,
    ListRepositories,
    UpdateRepositories,
    AddRepository,
    RemoveRepository,
}

const ACTIONS: [MenuAction; 9] = [
    MenuAction::Exit,
    MenuAction::InstallCog,
    MenuAction::UninstallCog,
    MenuAction::UpdateCogs,
    MenuAction::ListCogs,
    MenuAction::ListRepositories,
    MenuAction::UpdateRepositories,
    MenuAction::AddRepository,
    MenuAction::RemoveRepository,
];

impl MenuAction {
    pub fn from_choice(choice: &str) -> Option<Self> {
        let index: usize = choice.trim().parse().ok()?;
        ACTIONS.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Exit => "Exit.",
            MenuAction::InstallCog => "Install a cog.",
            MenuAction::UninstallCog => "Uninstall a cog.",
            MenuAction::UpdateCogs => "Update cogs.",
            MenuAction::ListCogs => "List cogs in a repository.",
            MenuAction::ListRepositories => "List repositories.",
            MenuAction::UpdateRepositories => "Update repositories.",
            MenuAction::AddRepository => "Add a repository.",
            MenuAction::RemoveRepository => "Remove a repository.",
        }
    }
}

/// Line-oriented console over any reader/writer pair.
///
/// Every action prints its own errors as `ERROR: ...` and returns whether it
/// succeeded; only I/O errors on the console itself are returned as `Err`.
/// The menu loop ignores the outcome and keeps going.
pub struct Console<'a, V: Vcs, R: BufRead, W: Write> {
    manager: &'a RepoManager<V>,
    input: R,
    output: W,
}

impl<'a, V: Vcs, R: BufRead, W: Write> Console<'a, V, R, W> {
    pub fn new(manager: &'a RepoManager<V>, input: R, output: W) -> Self {
        Self {
            manager,
            input,
            output,
        }
    }

    /// Show the menu until the user picks `0` or input ends
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "Choose action:")?;
            for (number, action) in ACTIONS.iter().enumerate().skip(1) {
                writeln!(self.output, "{}. {}", number, action.label())?;
            }
            writeln!(self.output, "0. {}", MenuAction::Exit.label())?;

            let Some(choice) = self.read_line()? else {
                return Ok(());
            };
            match MenuAction::from_choice(&choice) {
                None => writeln!(self.output, "Invalid choice!\n")?,
                Some(MenuAction::Exit) => return Ok(()),
                Some(action) => {
                    self.perform(action)?;
                }
            }
        }
    }

    /// Ask for whatever `action` needs, then run it; `false` when it failed or input ended
    pub fn perform(&mut self, action: MenuAction) -> io::Result<bool> {
        match action {
            MenuAction::Exit => Ok(true),
            MenuAction::InstallCog => {
                let Some(repo) = self.ask("Enter repository name:")? else {
                    return Ok(false);
                };
                if !self.manager.repo_exists(&repo) {
                    return self.print_error(&RepoError::RepoNotFound(repo));
                }
                let Some(cog) = self.ask("Enter cog name:")? else {
                    return Ok(false);
                };
                self.install_cog(&repo, &cog)
            }
            MenuAction::UninstallCog => match self.ask("Enter cog name:")? {
                Some(cog) => self.uninstall_cog(&cog),
                None => Ok(false),
            },
            MenuAction::UpdateCogs => self.update_cogs(),
            MenuAction::ListCogs => match self.ask("Enter repository name:")? {
                Some(repo) => self.list_cogs(&repo),
                None => Ok(false),
            },
            MenuAction::ListRepositories => self.list_repositories(),
            MenuAction::UpdateRepositories => self.update_repositories(),
            MenuAction::AddRepository => match self.ask("Enter repository address:")? {
                Some(url) => self.add_repository(&url, None),
                None => Ok(false),
            },
            MenuAction::RemoveRepository => match self.ask("Enter repository name:")? {
                Some(repo) => self.remove_repository(&repo),
                None => Ok(false),
            },
        }
    }

    pub fn install_cog(&mut self, repo: &str, cog: &str) -> io::Result<bool> {
        match self.manager.install_cog(repo, cog) {
            Ok(()) => self.print_done(format_args!("Installed {} from {}.", cog, repo)),
            Err(e) => self.print_error(&e),
        }
    }

    pub fn uninstall_cog(&mut self, cog: &str) -> io::Result<bool> {
        match self.manager.uninstall_cog(cog) {
            Ok(()) => self.print_done(format_args!("Uninstalled {}.", cog)),
            Err(e) => self.print_error(&e),
        }
    }

    /// Succeeds only when every installed cog was refreshed
    pub fn update_cogs(&mut self) -> io::Result<bool> {
        let report = match self.manager.update_cogs() {
            Ok(report) => report,
            Err(e) => return self.print_error(&e),
        };
        for cog in &report.updated {
            writeln!(self.output, "Updated {}.", cog)?;
        }
        for (cog, e) in &report.failed_cogs {
            writeln!(self.output, "ERROR: {}: {}", cog, e)?;
        }
        if let Some(summary) = report.summary() {
            writeln!(self.output, "{}", summary)?;
        }
        Ok(report.failed_repos.is_empty() && report.failed_cogs.is_empty())
    }

    pub fn list_cogs(&mut self, repo: &str) -> io::Result<bool> {
        match self.manager.list_cogs(repo) {
            Ok(cogs) => self.print_list(&cogs),
            Err(e) => self.print_error(&e),
        }
    }

    pub fn list_repositories(&mut self) -> io::Result<bool> {
        match self.manager.list_repositories() {
            Ok(repos) => self.print_list(&repos),
            Err(e) => self.print_error(&e),
        }
    }

    /// Succeeds only when every repository updated
    pub fn update_repositories(&mut self) -> io::Result<bool> {
        let results = match self.manager.update_repositories() {
            Ok(results) => results,
            Err(e) => return self.print_error(&e),
        };
        let mut all_updated = true;
        for (repo, result) in results {
            match result {
                Ok(()) => writeln!(self.output, "Updated {}.", repo)?,
                Err(e) => {
                    all_updated = false;
                    writeln!(self.output, "ERROR: {}: {}", repo, e)?
                }
            }
        }
        Ok(all_updated)
    }

    /// Clone `url`; without an explicit name, derive one or keep asking until a usable one is given
    pub fn add_repository(&mut self, url: &str, name: Option<&str>) -> io::Result<bool> {
        let name = match name {
            Some(name) => name.to_string(),
            None => match self.manager.suggest_name(url) {
                Some(name) => name,
                None => {
                    writeln!(self.output, "Couldn't automatically determine repository name.")?;
                    match self.ask_repo_name()? {
                        Some(name) => name,
                        None => return Ok(false),
                    }
                }
            },
        };

        match self.manager.add_repository(url, &name) {
            Ok(_) => self.print_done(format_args!("Added repository {}.", name)),
            Err(e) => self.print_error(&e),
        }
    }

    pub fn remove_repository(&mut self, repo: &str) -> io::Result<bool> {
        match self.manager.remove_repository(repo) {
            Ok(()) => self.print_done(format_args!("Removed repository {}.", repo)),
            Err(e) => self.print_error(&e),
        }
    }

    fn ask_repo_name(&mut self) -> io::Result<Option<String>> {
        loop {
            let Some(name) = self.ask("Enter repository name:")? else {
                return Ok(None);
            };
            match self.manager.check_name(&name) {
                Ok(()) => return Ok(Some(name)),
                Err(e) => {
                    self.print_error(&e)?;
                }
            }
        }
    }

    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        writeln!(self.output, "{}", question)?;
        self.read_line()
    }

    /// Prompt with `> `; `None` at end of input
    fn read_line(&mut self) -> io::Result<Option<String>> {
        write!(self.output, "> ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn print_list(&mut self, names: &[String]) -> io::Result<bool> {
        for name in names {
            writeln!(self.output, "- {}", name)?;
        }
        Ok(true)
    }

    fn print_done(&mut self, message: fmt::Arguments<'_>) -> io::Result<bool> {
        writeln!(self.output, "{}", message)?;
        Ok(true)
    }

    fn print_error(&mut self, error: &RepoError) -> io::Result<bool> {
        writeln!(self.output, "ERROR: {}", error)?;
        Ok(false)
    }
}
