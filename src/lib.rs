//! cogbot - a chat bot whose features live in hot-swappable cog packages

pub mod application;
pub mod cogs;
pub mod domain;
pub mod infrastructure;
pub mod manager;
