//! Cog repository manager
//!
//! Keeps git clones of cog repositories under `repos/` and copies
//! individual cogs out of them into the external namespace directory,
//! recording in `installed_cogs.json` which repository each came from.

pub mod fs;
pub mod git;
pub mod index;
pub mod menu;
pub mod naming;
pub mod repos;

pub use git::{GitCli, Vcs};
pub use index::InstalledCogs;
pub use menu::{Console, MenuAction};
pub use repos::{CogUpdateReport, Layout, RepoManager};
