//! Package loader - load, reload and unload packages across namespaces

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use crate::application::errors::PackageError;
use crate::domain::entities::Command;
use super::registry::PackageInfo;
use super::{LoadedPackage, Namespace, Package, PackageRegistry};

/// Loads packages from an ordered list of namespaces.
///
/// Earlier namespaces shadow later ones: `load("foo")` activates
/// `ext_cogs.foo` when the external namespace has it and only falls back to
/// `cogs.foo` when it does not. The registry of active packages lives here
/// and is only mutated through `load`, `reload` and `unload`.
pub struct PackageLoader {
    namespaces: Vec<Box<dyn Namespace>>,
    registry: RwLock<PackageRegistry>,
}

impl PackageLoader {
    pub fn new(registry: PackageRegistry) -> Self {
        Self {
            namespaces: Vec::new(),
            registry: RwLock::new(registry),
        }
    }

    /// Append a namespace with lower priority than the ones already added
    pub fn with_namespace<N: Namespace + 'static>(mut self, namespace: N) -> Self {
        self.namespaces.push(Box::new(namespace));
        self
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(|ns| ns.label())
    }

    /// Load `name` from the first namespace that has it
    pub async fn load(&self, name: &str) -> Result<String, PackageError> {
        let mut registry = self.registry.write().await;
        self.load_locked(&mut registry, name).await
    }

    /// Reload `name` in the namespace it is currently active in
    pub async fn reload(&self, name: &str) -> Result<String, PackageError> {
        let mut registry = self.registry.write().await;

        for namespace in &self.namespaces {
            let qualified = namespace.qualify(name);
            let Some(previous) = registry.remove(&qualified) else {
                continue;
            };
            previous.cog().teardown().await;

            return match namespace.open(name) {
                Ok(package) => {
                    match Self::activate(&mut registry, &qualified, package).await {
                        Ok(()) => {
                            info!("Reloaded package {}", qualified);
                            Ok(qualified)
                        }
                        Err(e) => {
                            Self::restore(&mut registry, previous).await;
                            Err(e)
                        }
                    }
                }
                Err(PackageError::NotFound(_)) => {
                    warn!("Package {} no longer exists, loading {} afresh", qualified, name);
                    drop(previous);
                    self.load_locked(&mut registry, name).await
                }
                Err(e) => {
                    Self::restore(&mut registry, previous).await;
                    Err(e)
                }
            };
        }

        Err(PackageError::NotLoaded(name.to_string()))
    }

    /// Unload `name` from the first namespace it is active in
    pub async fn unload(&self, name: &str) -> Result<String, PackageError> {
        let mut registry = self.registry.write().await;

        for namespace in &self.namespaces {
            let qualified = namespace.qualify(name);
            if let Some(package) = registry.remove(&qualified) {
                package.cog().teardown().await;
                info!("Unloaded package {}", qualified);
                return Ok(qualified);
            }
        }

        Err(PackageError::NotLoaded(name.to_string()))
    }

    /// Tear down every active package
    pub async fn unload_all(&self) {
        let mut registry = self.registry.write().await;
        for package in registry.drain() {
            package.cog().teardown().await;
            debug!("Unloaded package {}", package.qualified_name());
        }
    }

    pub async fn is_loaded(&self, name: &str) -> bool {
        let registry = self.registry.read().await;
        self.namespaces
            .iter()
            .any(|ns| registry.contains(&ns.qualify(name)))
    }

    pub async fn loaded(&self) -> Vec<PackageInfo> {
        self.registry.read().await.info()
    }

    /// Package owning the command `name`
    pub async fn find_command(&self, name: &str) -> Option<(Arc<LoadedPackage>, Command)> {
        self.registry.read().await.find_command(name)
    }

    /// Every command registered by active packages
    pub async fn commands(&self) -> Vec<Command> {
        let registry = self.registry.read().await;
        registry
            .names()
            .iter()
            .filter_map(|q| registry.get(q))
            .flat_map(|p| p.commands().to_vec())
            .collect()
    }

    async fn load_locked(&self, registry: &mut PackageRegistry, name: &str) -> Result<String, PackageError> {
        for namespace in &self.namespaces {
            let qualified = namespace.qualify(name);
            if registry.contains(&qualified) {
                return Err(PackageError::AlreadyLoaded(qualified));
            }

            let package = match namespace.open(name) {
                Err(PackageError::NotFound(_)) => {
                    debug!("{} not found, trying next namespace", qualified);
                    continue;
                }
                other => other?,
            };

            Self::activate(registry, &qualified, package).await?;
            info!("Loaded package {}", qualified);
            return Ok(qualified);
        }

        Err(PackageError::NotFound(name.to_string()))
    }

    async fn activate(registry: &mut PackageRegistry, qualified: &str, package: Package) -> Result<(), PackageError> {
        let commands = package.cog().commands();
        registry
            .check_commands(qualified, &commands)
            .map_err(|e| PackageError::failed(qualified, e))?;

        package
            .cog()
            .setup()
            .await
            .map_err(|e| PackageError::failed(qualified, e))?;

        registry.insert(Arc::new(LoadedPackage::new(qualified, package, commands)));
        Ok(())
    }

    /// Put a package back after its replacement failed to come up
    async fn restore(registry: &mut PackageRegistry, previous: Arc<LoadedPackage>) {
        match previous.cog().setup().await {
            Ok(()) => {
                warn!("Restored previous version of {}", previous.qualified_name());
                registry.insert(previous);
            }
            Err(e) => {
                error!(
                    "Previous version of {} failed to set up again and stays unloaded: {}",
                    previous.qualified_name(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use async_trait::async_trait;
    use crate::application::errors::{CogError, CommandError, PackageErrorKind};
    use crate::cogs::{BuiltinNamespace, Cog, Context};

    struct Echo {
        command: &'static str,
        fail_setup: bool,
        teardowns: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Cog for Echo {
        fn name(&self) -> &str {
            "Echo"
        }

        fn commands(&self) -> Vec<Command> {
            vec![Command::new(self.command)]
        }

        async fn setup(&self) -> Result<(), CogError> {
            if self.fail_setup {
                return Err(CogError::Setup("refusing to start".to_string()));
            }
            Ok(())
        }

        async fn teardown(&self) {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
        }

        async fn invoke(&self, _command: &str, ctx: &Context) -> Result<Option<String>, CommandError> {
            Ok(Some(ctx.args().join(" ")))
        }
    }

    fn echo(command: &'static str, teardowns: &Arc<AtomicUsize>) -> impl Fn() -> Result<Arc<dyn Cog>, CogError> + Send + Sync + 'static {
        let teardowns = teardowns.clone();
        move || {
            Ok(Arc::new(Echo {
                command,
                fail_setup: false,
                teardowns: teardowns.clone(),
            }) as Arc<dyn Cog>)
        }
    }

    #[tokio::test]
    async fn test_unload_tears_down_and_drops_commands() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let loader = PackageLoader::new(PackageRegistry::new())
            .with_namespace(BuiltinNamespace::new("cogs").with_package("echo", echo("echo", &teardowns)));

        assert_eq!(loader.load("echo").await.unwrap(), "cogs.echo");
        assert!(loader.find_command("ECHO").await.is_some());

        assert_eq!(loader.unload("echo").await.unwrap(), "cogs.echo");
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        assert!(loader.find_command("echo").await.is_none());
        assert!(!loader.is_loaded("echo").await);
    }

    #[tokio::test]
    async fn test_command_clash_fails_load() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let loader = PackageLoader::new(PackageRegistry::new().with_reserved(["load"]))
            .with_namespace(
                BuiltinNamespace::new("cogs")
                    .with_package("first", echo("say", &teardowns))
                    .with_package("second", echo("say", &teardowns))
                    .with_package("greedy", echo("load", &teardowns)),
            );

        loader.load("first").await.unwrap();
        let err = loader.load("second").await.unwrap_err();
        assert_eq!(err.kind(), PackageErrorKind::Failed);
        let err = loader.load("greedy").await.unwrap_err();
        assert_eq!(err.kind(), PackageErrorKind::Failed);
        assert_eq!(loader.loaded().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_setup_leaves_registry_untouched() {
        let loader = PackageLoader::new(PackageRegistry::new()).with_namespace(
            BuiltinNamespace::new("cogs").with_package("grumpy", || {
                Ok(Arc::new(Echo {
                    command: "grumpy",
                    fail_setup: true,
                    teardowns: Arc::new(AtomicUsize::new(0)),
                }) as Arc<dyn Cog>)
            }),
        );

        let err = loader.load("grumpy").await.unwrap_err();
        assert!(matches!(err, PackageError::Failed { ref name, .. } if name == "cogs.grumpy"));
        assert!(loader.loaded().await.is_empty());
    }

    #[tokio::test]
    async fn test_unload_all_empties_registry() {
        let teardowns = Arc::new(AtomicUsize::new(0));
        let loader = PackageLoader::new(PackageRegistry::new()).with_namespace(
            BuiltinNamespace::new("cogs")
                .with_package("a", echo("a", &teardowns))
                .with_package("b", echo("b", &teardowns)),
        );
        loader.load("a").await.unwrap();
        loader.load("b").await.unwrap();

        loader.unload_all().await;
        assert_eq!(teardowns.load(Ordering::SeqCst), 2);
        assert!(loader.loaded().await.is_empty());
    }
}
