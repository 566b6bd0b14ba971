//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod command;

pub use user::User;
pub use message::{Message, Content};
pub use command::{Check, Command, CommandRegistry};
