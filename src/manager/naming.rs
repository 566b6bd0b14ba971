//! Repository and cog name rules

use once_cell::sync::Lazy;
use regex_lite::Regex;

static REPO_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("repository name pattern is valid")
});

/// Letters, digits, `_`, `-` and `.`, not starting or ending with a dot
pub fn is_valid_repo_name(name: &str) -> bool {
    !name.starts_with('.') && !name.ends_with('.') && REPO_NAME.is_match(name)
}

/// A cog name must be a single visible entry inside its repository / the install dir
pub fn is_valid_cog_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

/// Last non-empty path segment of a repository address, without a `.git` suffix.
///
/// Understands URLs (`https://host/owner/repo.git`), scp-like addresses
/// (`git@host:owner/repo.git`) and plain paths.
pub fn candidate_name(address: &str) -> Option<String> {
    let address = address.trim();
    let segment = match url::Url::parse(address) {
        Ok(url) if url.path_segments().is_some() => url
            .path_segments()
            .and_then(|segments| segments.rev().find(|s| !s.is_empty()).map(str::to_string)),
        _ => address
            .split(['/', '\\', ':'])
            .rev()
            .find(|s| !s.is_empty())
            .map(str::to_string),
    }?;

    let segment = segment
        .strip_suffix(".git")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or(segment);
    Some(segment)
}
