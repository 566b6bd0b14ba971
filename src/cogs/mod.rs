//! Cog package system for cogbot
//!
//! A cog is a self-contained unit of bot functionality: it declares the
//! commands it answers, gets a `setup` call when activated and a `teardown`
//! call when deactivated. Cogs are packaged either into the bot binary
//! (the built-in namespace) or as shared libraries dropped into the external
//! namespace directory by `cog-manager`.

pub mod builtin;
pub mod external;
pub mod loader;
pub mod manifest;
pub mod namespace;
pub mod registry;

use async_trait::async_trait;
use crate::application::errors::{CogError, CommandError};
use crate::domain::entities::{Command, Message};

pub use external::ExternalNamespace;
pub use loader::PackageLoader;
pub use manifest::CogManifest;
pub use namespace::{BuiltinNamespace, Namespace, Package};
pub use registry::{LoadedPackage, PackageRegistry};

/// Invocation context handed to a cog command
#[derive(Debug, Clone)]
pub struct Context {
    pub message: Message,
    /// Prefix the command was invoked with, for help output
    pub prefix: String,
}

impl Context {
    pub fn new(message: Message, prefix: impl Into<String>) -> Self {
        Self {
            message,
            prefix: prefix.into(),
        }
    }

    pub fn args(&self) -> &[String] {
        self.message.args()
    }

    /// Positional argument or `MissingArgument` naming it
    pub fn arg(&self, index: usize, name: &str) -> Result<&str, CommandError> {
        self.args()
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CommandError::MissingArgument(name.to_string()))
    }
}

/// Core trait every cog implements
#[async_trait]
pub trait Cog: Send + Sync {
    /// Display name of the cog
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Commands this cog registers while it is loaded
    fn commands(&self) -> Vec<Command>;

    /// Called once when the package is activated
    async fn setup(&self) -> Result<(), CogError> {
        Ok(())
    }

    /// Called once when the package is deactivated
    async fn teardown(&self) {}

    /// Run one of the commands returned by [`Cog::commands`]
    async fn invoke(&self, command: &str, ctx: &Context) -> Result<Option<String>, CommandError>;
}

/// Exports the `cog_setup` entry point of an external cog package.
///
/// ```ignore
/// cogbot::export_cog!(MyCog::new());
/// ```
#[macro_export]
macro_rules! export_cog {
    ($ctor:expr) => {
        #[no_mangle]
        pub extern "C" fn cog_setup() -> *mut ::std::boxed::Box<dyn $crate::cogs::Cog> {
            let cog: ::std::boxed::Box<dyn $crate::cogs::Cog> = ::std::boxed::Box::new($ctor);
            ::std::boxed::Box::into_raw(::std::boxed::Box::new(cog))
        }
    };
}
