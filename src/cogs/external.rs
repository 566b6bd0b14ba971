//! External namespace - cog packages shipped as shared libraries
//!
//! Layout of the namespace directory:
//!
//! ```text
//! ext_cogs/
//!   weather/            package directory
//!     cog.yaml          optional manifest naming the library
//!     libweather.so
//!   dice.so             single-file package
//! ```

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use libloading::{Library, Symbol};
use crate::application::errors::PackageError;
use super::manifest::{CogManifest, MANIFEST_FILE};
use super::{Cog, Namespace, Package};

/// Symbol every external package exports, see [`export_cog!`](crate::export_cog)
pub const ENTRY_POINT: &[u8] = b"cog_setup";

/// Signature of the entry point
pub type CogSetupFn = unsafe extern "C" fn() -> *mut Box<dyn Cog>;

/// Packages found in a directory on disk
pub struct ExternalNamespace {
    label: String,
    root: PathBuf,
}

impl ExternalNamespace {
    pub fn new(label: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            root: root.into(),
        }
    }

    /// Library backing the package `name`; `Ok(None)` when the package exists but has none
    fn library_path(&self, name: &str) -> Result<Option<PathBuf>, PackageError> {
        let dir = self.root.join(name);
        if dir.is_dir() {
            let manifest_path = dir.join(MANIFEST_FILE);
            let library = match CogManifest::from_file(&manifest_path) {
                Ok(manifest) => manifest.library.map(|lib| dir.join(lib)),
                Err(_) if !manifest_path.exists() => None,
                Err(e) => return Err(e),
            }
            .unwrap_or_else(|| dir.join(library_file_name(name)));

            return Ok(library.is_file().then_some(library));
        }

        let candidates = [
            self.root.join(format!("{}{}", name, DLL_SUFFIX)),
            self.root.join(library_file_name(name)),
        ];
        match candidates.into_iter().find(|path| path.is_file()) {
            Some(path) => Ok(Some(path)),
            None => Err(PackageError::NotFound(self.qualify(name))),
        }
    }
}

impl Namespace for ExternalNamespace {
    fn label(&self) -> &str {
        &self.label
    }

    fn open(&self, name: &str) -> Result<Package, PackageError> {
        let qualified = self.qualify(name);
        if !is_package_name(name) {
            return Err(PackageError::NotFound(qualified));
        }

        let library_path = self
            .library_path(name)?
            .ok_or_else(|| PackageError::EntryPointMissing(qualified.clone()))?;

        // A private copy gives every open its own image, so a reload picks up
        // a library that was replaced on disk while the old one is still mapped.
        // The copy is removed when the library is closed.
        let shadow = std::env::temp_dir().join(format!(
            "cogbot-{}-{}",
            uuid::Uuid::new_v4(),
            library_path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));
        std::fs::copy(&library_path, &shadow)
            .map_err(|e| PackageError::failed(qualified.clone(), e))?;

        let opened = unsafe { Library::new(&shadow) };
        let library = match opened {
            Ok(library) => ShadowLibrary::new(library, shadow),
            Err(e) => {
                let _ = std::fs::remove_file(&shadow);
                return Err(PackageError::failed(qualified, e));
            }
        };

        let raw = {
            let setup: Symbol<CogSetupFn> = unsafe { library.get(ENTRY_POINT) }
                .map_err(|_| PackageError::EntryPointMissing(qualified.clone()))?;
            unsafe { setup() }
        };
        if raw.is_null() {
            return Err(PackageError::failed(qualified, "cog_setup returned null"));
        }

        let cog: Box<Box<dyn Cog>> = unsafe { Box::from_raw(raw) };
        let cog: Arc<dyn Cog> = Arc::from(*cog);
        tracing::debug!("Opened {} from {}", qualified, library_path.display());

        Ok(Package::external(cog, library_path.display().to_string(), library))
    }
}

/// A library opened from a private copy; the copy is deleted once the library is closed
pub struct ShadowLibrary {
    library: ManuallyDrop<Library>,
    copy: PathBuf,
}

impl ShadowLibrary {
    fn new(library: Library, copy: PathBuf) -> Self {
        Self {
            library: ManuallyDrop::new(library),
            copy,
        }
    }

    pub fn copy_path(&self) -> &Path {
        &self.copy
    }
}

impl Deref for ShadowLibrary {
    type Target = Library;

    fn deref(&self) -> &Library {
        &self.library
    }
}

impl Drop for ShadowLibrary {
    fn drop(&mut self) {
        // SAFETY: the library is not touched again after this point
        unsafe { ManuallyDrop::drop(&mut self.library) };
        if let Err(e) = std::fs::remove_file(&self.copy) {
            tracing::warn!("Could not remove library copy {}: {}", self.copy.display(), e);
        }
    }
}

fn library_file_name(name: &str) -> String {
    format!("{}{}{}", DLL_PREFIX, name.replace('-', "_"), DLL_SUFFIX)
}

/// Package names are plain identifiers; anything else cannot live in the namespace
pub fn is_package_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Name a namespace entry is loaded under: a package directory as is,
/// a single-file package without its library suffix
pub fn package_name_of(entry: &str, is_dir: bool) -> Option<&str> {
    let name = if is_dir { entry } else { entry.strip_suffix(DLL_SUFFIX)? };
    is_package_name(name).then_some(name)
}
