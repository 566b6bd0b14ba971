//! Filesystem helpers for cog installation

use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Copy a directory tree or a single file from `src` to `dst`.
///
/// Existing directories are merged into and existing files overwritten.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    if !src.is_dir() {
        return copy_file(src, dst);
    }

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Copy next to the destination, then rename over it, so a library that is
/// currently mapped by the bot is replaced rather than rewritten in place
fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let file_name = dst
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no file name"))?;
    let staging = dst.with_file_name(format!(".{}.cogtmp", file_name.to_string_lossy()));

    fs::copy(src, &staging)?;
    if let Err(e) = fs::rename(&staging, dst) {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    Ok(())
}

/// Remove a file or directory tree, clearing read-only bits that block removal
pub fn remove_tree(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if !metadata.is_dir() {
        return match fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                make_writable(path)?;
                fs::remove_file(path)
            }
            other => other,
        };
    }

    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            tracing::debug!("Clearing read-only bits under {}", path.display());
            for entry in WalkDir::new(path).into_iter().filter_map(Result::ok) {
                if !entry.path_is_symlink() {
                    make_writable(entry.path())?;
                }
            }
            fs::remove_dir_all(path)
        }
        other => other,
    }
}

fn make_writable(path: &Path) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        permissions.set_readonly(false);
    }
    fs::set_permissions(path, permissions)
}
