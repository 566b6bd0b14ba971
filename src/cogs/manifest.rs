//! External cog package manifest (`cog.yaml`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::application::errors::PackageError;

/// File name of the manifest inside a package directory
pub const MANIFEST_FILE: &str = "cog.yaml";

/// Cog package metadata
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CogManifest {
    /// Package name, informational
    pub name: Option<String>,

    pub version: Option<String>,

    pub description: Option<String>,

    pub author: Option<String>,

    /// Shared library, relative to the package directory
    pub library: Option<PathBuf>,
}

impl CogManifest {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PackageError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PackageError::failed(origin.clone(), e))?;

        serde_yaml::from_str(&content).map_err(|e| PackageError::failed(origin, e))
    }
}
