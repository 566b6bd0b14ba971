//! Cog packages compiled into the bot

pub mod samplecog;

use std::sync::Arc;
use super::{BuiltinNamespace, Cog};

/// The built-in namespace with every bundled package
pub fn namespace(label: impl Into<String>) -> BuiltinNamespace {
    BuiltinNamespace::new(label)
        .with_package("samplecog", || Ok(Arc::new(samplecog::SampleCog::new()) as Arc<dyn Cog>))
}
