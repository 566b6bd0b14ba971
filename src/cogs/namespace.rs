//! Package namespaces - where a package name is resolved to a cog

use std::collections::BTreeMap;
use std::sync::Arc;
use crate::application::errors::{CogError, PackageError};
use super::external::ShadowLibrary;
use super::Cog;

/// A package opened from a namespace but not yet activated
pub struct Package {
    pub(crate) cog: Arc<dyn Cog>,
    pub(crate) origin: String,
    pub(crate) library: Option<ShadowLibrary>,
}

impl Package {
    pub fn builtin(cog: Arc<dyn Cog>) -> Self {
        Self {
            cog,
            origin: "built-in".to_string(),
            library: None,
        }
    }

    pub fn external(cog: Arc<dyn Cog>, origin: impl Into<String>, library: ShadowLibrary) -> Self {
        Self {
            cog,
            origin: origin.into(),
            library: Some(library),
        }
    }

    pub fn cog(&self) -> &Arc<dyn Cog> {
        &self.cog
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// A place packages are looked up in.
///
/// The loader consults its namespaces in priority order; `open` returning
/// `PackageError::NotFound` passes resolution on to the next one.
pub trait Namespace: Send + Sync {
    /// Short label used as the qualified-name prefix (`ext_cogs`, `cogs`)
    fn label(&self) -> &str;

    fn qualify(&self, name: &str) -> String {
        format!("{}.{}", self.label(), name)
    }

    /// Instantiate the package called `name`
    fn open(&self, name: &str) -> Result<Package, PackageError>;
}

/// Constructor of a built-in cog
pub type CogFactory = Arc<dyn Fn() -> Result<Arc<dyn Cog>, CogError> + Send + Sync>;

/// Packages compiled into the bot binary
pub struct BuiltinNamespace {
    label: String,
    packages: BTreeMap<String, Option<CogFactory>>,
}

impl BuiltinNamespace {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            packages: BTreeMap::new(),
        }
    }

    /// Register a package with its setup entry point
    pub fn with_package<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Cog>, CogError> + Send + Sync + 'static,
    {
        self.packages.insert(name.into(), Some(Arc::new(factory)));
        self
    }

    /// Declare a package that ships without a setup entry point
    pub fn declare(mut self, name: impl Into<String>) -> Self {
        self.packages.insert(name.into(), None);
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.packages.keys().cloned().collect()
    }
}

impl Namespace for BuiltinNamespace {
    fn label(&self) -> &str {
        &self.label
    }

    fn open(&self, name: &str) -> Result<Package, PackageError> {
        let qualified = self.qualify(name);
        match self.packages.get(name) {
            None => Err(PackageError::NotFound(qualified)),
            Some(None) => Err(PackageError::EntryPointMissing(qualified)),
            Some(Some(factory)) => factory()
                .map(Package::builtin)
                .map_err(|e| PackageError::failed(qualified, e)),
        }
    }
}
