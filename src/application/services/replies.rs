//! Reply table - what the bot answers when a command fails

use crate::application::errors::{CommandError, PackageError, PackageErrorKind};

/// Loader operation a reply is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Load,
    Reload,
    Unload,
}

impl Verb {
    pub fn past(&self) -> &'static str {
        match self {
            Verb::Load => "loaded",
            Verb::Reload => "reloaded",
            Verb::Unload => "unloaded",
        }
    }
}

/// What to send back for a failed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Send the help text of the invoked command
    Help,
    /// Log only
    Silent,
}

/// `{name}` is the package name as typed, `{verb}` the past tense of the operation
const PACKAGE_REPLIES: &[(PackageErrorKind, &str)] = &[
    (PackageErrorKind::NotLoaded, "Cog package with name `{name}` wasn't loaded."),
    (PackageErrorKind::NotFound, "Can't find cog package with name `{name}`."),
    (PackageErrorKind::AlreadyLoaded, "Cog package with name `{name}` is already loaded."),
    (
        PackageErrorKind::EntryPointMissing,
        "Cog package with name `{name}` doesn't have `cog_setup()` function.",
    ),
    (
        PackageErrorKind::Failed,
        "Cog package with name `{name}` couldn't be {verb}. See logs for more details.",
    ),
];

/// Acknowledgement for a successful loader operation
pub fn package_success(name: &str, verb: Verb) -> String {
    format!("{} {}.", name, verb.past())
}

/// Chat reply for a loader error
pub fn package_reply(error: &PackageError, name: &str, verb: Verb) -> String {
    let kind = error.kind();
    PACKAGE_REPLIES
        .iter()
        .find(|(k, _)| *k == kind)
        // `{name}` last: it is user input and must not be expanded further
        .map(|(_, template)| template.replace("{verb}", verb.past()).replace("{name}", name))
        .unwrap_or_else(|| format!("{} failed.", name))
}

/// Chat reply for a command error
pub fn command_reply(error: &CommandError) -> Reply {
    match error {
        CommandError::MissingArgument(_) => Reply::Help,
        CommandError::BadArgument(Some(msg)) => Reply::Text(msg.clone()),
        CommandError::BadArgument(None) => Reply::Help,
        CommandError::NotFound(_)
        | CommandError::CheckFailed(_)
        | CommandError::ExecutionFailed(_) => Reply::Silent,
    }
}
