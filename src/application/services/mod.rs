//! Application services - Business logic orchestration

pub mod command_service;
pub mod replies;

pub use command_service::CommandService;
pub use replies::{Reply, Verb};
