//! Repository manager integration tests
//! Run with: cargo test --test manager_test

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use cogbot::application::errors::RepoError;
use cogbot::manager::fs::copy_tree;
use cogbot::manager::{Console, InstalledCogs, Layout, RepoManager, Vcs};
use tempfile::TempDir;

/// Clones by copying a local directory; fetches are recorded and may be made to fail
#[derive(Default)]
struct FakeGit {
    sources: HashMap<String, PathBuf>,
    broken: HashSet<String>,
    fetches: RefCell<Vec<String>>,
}

fn repo_name(repo: &Path) -> String {
    repo.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Vcs for FakeGit {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), RepoError> {
        let source = self.sources.get(url).ok_or_else(|| RepoError::Git {
            command: "clone".to_string(),
            code: Some(128),
        })?;
        copy_tree(source, dest)?;
        Ok(())
    }

    fn fetch(&self, repo: &Path) -> Result<(), RepoError> {
        let name = repo_name(repo);
        self.fetches.borrow_mut().push(name.clone());
        if self.broken.contains(&name) {
            return Err(RepoError::Git {
                command: "fetch".to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }

    fn reset_to_upstream(&self, _repo: &Path) -> Result<(), RepoError> {
        Ok(())
    }
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Upstream repository served under `url` with one file per cog
    fn upstream(&self, git: &mut FakeGit, url: &str, cogs: &[&str]) {
        let root = self.dir.path().join("upstream").join(git.sources.len().to_string());
        for cog in cogs {
            let cog_dir = root.join(cog);
            fs::create_dir_all(&cog_dir).unwrap();
            fs::write(cog_dir.join("cog.yaml"), format!("name: {}\n", cog)).unwrap();
            fs::write(cog_dir.join("lib.so"), "v1").unwrap();
        }
        git.sources.insert(url.to_string(), root);
    }

    fn layout(&self) -> Layout {
        let root = self.dir.path();
        Layout::new(root.join("repos"), root.join("ext_cogs"), root.join("installed_cogs.json"))
    }

    fn install_listing(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.dir.path().join("ext_cogs")) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn read(path: PathBuf) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_install_then_uninstall_restores_state() {
    let ws = Workspace::new();
    let mut git = FakeGit::default();
    ws.upstream(&mut git, "https://example.com/me/cogs-repo.git", &["foo", "bar"]);
    let manager = RepoManager::new(ws.layout(), git);

    let name = manager.suggest_name("https://example.com/me/cogs-repo.git").unwrap();
    assert_eq!(name, "cogs-repo");
    manager.add_repository("https://example.com/me/cogs-repo.git", &name).unwrap();
    assert_eq!(manager.list_cogs("cogs-repo").unwrap(), vec!["bar", "foo"]);

    let index_before = manager.installed().unwrap();
    let listing_before = ws.install_listing();

    manager.install_cog("cogs-repo", "foo").unwrap();
    assert_eq!(read(ws.layout().installed_path("foo").join("lib.so")), "v1");
    assert_eq!(manager.installed().unwrap().repo_of("foo"), Some("cogs-repo"));
    assert!(matches!(
        manager.install_cog("cogs-repo", "foo"),
        Err(RepoError::AlreadyInstalled(_))
    ));

    manager.uninstall_cog("foo").unwrap();
    assert_eq!(manager.installed().unwrap(), index_before);
    assert_eq!(ws.install_listing(), listing_before);
    assert!(matches!(manager.uninstall_cog("foo"), Err(RepoError::NotInstalled(_))));
}

#[test]
fn test_unknown_repository_and_cog() {
    let ws = Workspace::new();
    let mut git = FakeGit::default();
    ws.upstream(&mut git, "https://example.com/r.git", &["foo"]);
    let manager = RepoManager::new(ws.layout(), git);
    manager.add_repository("https://example.com/r.git", "r").unwrap();

    let err = manager.install_cog("nope", "foo").unwrap_err();
    assert_eq!(err.to_string(), "Repository with this name does not exist!");
    let err = manager.install_cog("r", "missing").unwrap_err();
    assert_eq!(err.to_string(), "Cog with this name does not exist!");
    assert!(matches!(manager.install_cog("r", "../r"), Err(RepoError::CogNotFound(_))));
    assert!(manager.installed().unwrap().is_empty());
}

#[test]
fn test_cogs_sharing_a_repository_update_it_once() {
    let ws = Workspace::new();
    let mut git = FakeGit::default();
    ws.upstream(&mut git, "https://example.com/shared.git", &["foo", "bar"]);
    let manager = RepoManager::new(ws.layout(), git);
    manager.add_repository("https://example.com/shared.git", "shared").unwrap();
    manager.install_cog("shared", "foo").unwrap();
    manager.install_cog("shared", "bar").unwrap();

    // What a pull would have brought in
    for cog in ["foo", "bar"] {
        fs::write(ws.layout().cog_path("shared", cog).join("lib.so"), "v2").unwrap();
    }

    let report = manager.update_cogs().unwrap();
    assert_eq!(report.updated, vec!["bar", "foo"]);
    assert!(report.summary().is_none());
    assert_eq!(*manager.vcs().fetches.borrow(), vec!["shared"]);
    for cog in ["foo", "bar"] {
        assert_eq!(read(ws.layout().installed_path(cog).join("lib.so")), "v2");
    }
}

#[test]
fn test_failed_repository_skips_its_cogs() {
    let ws = Workspace::new();
    let mut git = FakeGit::default();
    ws.upstream(&mut git, "https://example.com/repoA.git", &["foo"]);
    ws.upstream(&mut git, "https://example.com/repoB.git", &["bar"]);
    git.broken.insert("repoA".to_string());
    let manager = RepoManager::new(ws.layout(), git);

    manager.add_repository("https://example.com/repoA.git", "repoA").unwrap();
    manager.add_repository("https://example.com/repoB.git", "repoB").unwrap();
    manager.install_cog("repoA", "foo").unwrap();
    manager.install_cog("repoB", "bar").unwrap();
    fs::write(ws.layout().cog_path("repoA", "foo").join("lib.so"), "v2").unwrap();
    fs::write(ws.layout().cog_path("repoB", "bar").join("lib.so"), "v2").unwrap();

    let report = manager.update_cogs().unwrap();
    assert_eq!(report.updated, vec!["bar"]);
    assert!(report.failed_repos.contains("repoA"));
    let summary = report.summary().unwrap();
    assert!(summary.contains("repoA"), "{}", summary);
    assert!(!summary.contains("repoB"), "{}", summary);

    assert_eq!(read(ws.layout().installed_path("foo").join("lib.so")), "v1");
    assert_eq!(read(ws.layout().installed_path("bar").join("lib.so")), "v2");
    assert_eq!(manager.installed().unwrap().repo_of("foo"), Some("repoA"));
}

#[test]
fn test_repository_names() {
    let ws = Workspace::new();
    let mut git = FakeGit::default();
    ws.upstream(&mut git, "https://github.com/someone/My-Cogs.git", &["foo"]);
    let manager = RepoManager::new(ws.layout(), git);

    assert_eq!(manager.suggest_name("https://github.com/someone/My-Cogs.git").as_deref(), Some("My-Cogs"));
    manager.add_repository("https://github.com/someone/My-Cogs.git", "My-Cogs").unwrap();

    assert_eq!(manager.suggest_name("https://github.com/other/My-Cogs"), None);
    assert!(matches!(manager.check_name("My-Cogs"), Err(RepoError::NameTaken(_))));
    assert!(matches!(manager.check_name("no spaces"), Err(RepoError::InvalidName(_))));

    let err = manager.add_repository("https://example.com/unknown.git", "unknown").unwrap_err();
    assert_eq!(err.to_string(), "git clone returned exit code 128");
    assert!(!ws.layout().repo_path("unknown").exists());
    assert_eq!(manager.list_repositories().unwrap(), vec!["My-Cogs"]);

    manager.remove_repository("My-Cogs").unwrap();
    assert!(manager.list_repositories().unwrap().is_empty());
}

#[test]
fn test_menu_prompts_for_a_name_it_cannot_derive() {
    let ws = Workspace::new();
    let mut git = FakeGit::default();
    ws.upstream(&mut git, "https://example.com/", &["foo"]);
    let manager = RepoManager::new(ws.layout(), git);

    let input = Cursor::new("9\n7\nhttps://example.com/\nbad name!\nmyrepo\n5\n0\n");
    let mut output = Vec::new();
    Console::new(&manager, input, &mut output).run().unwrap();
    let output = String::from_utf8(output).unwrap();

    assert!(output.starts_with("Choose action:\n1. Install a cog.\n"), "{}", output);
    assert!(output.contains("Invalid choice!"), "{}", output);
    assert!(output.contains("Couldn't automatically determine repository name."), "{}", output);
    assert!(output.contains("ERROR: Repo names can only contain"), "{}", output);
    assert!(output.contains("Added repository myrepo."), "{}", output);
    assert!(output.contains("- myrepo\n"), "{}", output);
    assert!(ws.layout().repo_path("myrepo").is_dir());
}

#[test]
fn test_menu_ends_at_end_of_input() {
    let ws = Workspace::new();
    let manager = RepoManager::new(ws.layout(), FakeGit::default());

    let mut output = Vec::new();
    Console::new(&manager, Cursor::new("4\n"), &mut output).run().unwrap();
    let output = String::from_utf8(output).unwrap();

    assert!(output.contains("Enter repository name:\n> "), "{}", output);
    assert!(output.ends_with("> "), "{}", output);
    assert_eq!(InstalledCogs::load(ws.layout().index_path).unwrap().len(), 0);
}

#[test]
fn test_update_repositories_continues_past_a_failure() {
    let ws = Workspace::new();
    let mut git = FakeGit::default();
    ws.upstream(&mut git, "https://example.com/a.git", &["foo"]);
    ws.upstream(&mut git, "https://example.com/b.git", &["bar"]);
    git.broken.insert("a".to_string());
    let manager = RepoManager::new(ws.layout(), git);
    manager.add_repository("https://example.com/a.git", "a").unwrap();
    manager.add_repository("https://example.com/b.git", "b").unwrap();

    let results = manager.update_repositories().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "a");
    assert!(matches!(&results[0].1, Err(RepoError::Git { command, .. }) if command == "fetch"));
    assert_eq!(results[1].0, "b");
    assert!(results[1].1.is_ok());
    assert_eq!(*manager.vcs().fetches.borrow(), vec!["a", "b"]);
}

#[test]
fn test_remove_unknown_repository() {
    let ws = Workspace::new();
    let mut git = FakeGit::default();
    ws.upstream(&mut git, "https://example.com/r.git", &["foo"]);
    let manager = RepoManager::new(ws.layout(), git);
    manager.add_repository("https://example.com/r.git", "r").unwrap();

    assert!(matches!(manager.remove_repository("nope"), Err(RepoError::RepoNotFound(_))));
    assert!(matches!(manager.remove_repository("../r"), Err(RepoError::RepoNotFound(_))));
    assert_eq!(manager.list_repositories().unwrap(), vec!["r"]);
}

#[test]
fn test_only_loadable_cogs_can_be_installed() {
    let ws = Workspace::new();
    let mut git = FakeGit::default();
    ws.upstream(&mut git, "https://example.com/r.git", &["foo"]);
    let manager = RepoManager::new(ws.layout(), git);
    manager.add_repository("https://example.com/r.git", "r").unwrap();
    fs::create_dir_all(ws.layout().repo_path("r").join(".git")).unwrap();
    fs::create_dir_all(ws.layout().cog_path("r", "my.cog")).unwrap();

    assert!(matches!(manager.install_cog("r", ".git"), Err(RepoError::CogNotFound(_))));
    let err = manager.install_cog("r", "my.cog").unwrap_err();
    assert!(matches!(err, RepoError::Unloadable(_)));
    assert!(err.to_string().starts_with("Cog with this name can't be loaded by the bot!"));

    assert!(ws.install_listing().is_empty());
    assert!(manager.installed().unwrap().is_empty());
}

#[test]
fn test_console_actions_report_failure() {
    let ws = Workspace::new();
    let mut git = FakeGit::default();
    ws.upstream(&mut git, "https://example.com/r.git", &["foo"]);
    git.broken.insert("r".to_string());
    let manager = RepoManager::new(ws.layout(), git);

    let mut output = Vec::new();
    let mut console = Console::new(&manager, Cursor::new(""), &mut output);
    assert!(!console.remove_repository("nope").unwrap());
    assert!(!console.install_cog("nope", "foo").unwrap());
    assert!(console.add_repository("https://example.com/r.git", Some("r")).unwrap());
    assert!(console.install_cog("r", "foo").unwrap());
    assert!(console.list_repositories().unwrap());
    assert!(!console.update_repositories().unwrap());
    assert!(!console.update_cogs().unwrap());
    // No name can be derived and input has already ended
    assert!(!console.add_repository("https://example.com/", None).unwrap());
    drop(console);

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("ERROR: Repository with this name does not exist!\n"), "{}", output);
    assert!(output.contains("Installed foo from r.\n"), "{}", output);
    assert!(output.contains("ERROR: r: git fetch returned exit code 1\n"), "{}", output);
}
