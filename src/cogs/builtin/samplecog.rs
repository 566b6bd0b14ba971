//! Demonstration cog: argument conversion and bad-argument replies

use std::fmt;
use std::str::FromStr;
use async_trait::async_trait;
use crate::application::errors::CommandError;
use crate::cogs::{Cog, Context};
use crate::domain::entities::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red = 1,
    Green = 2,
    Blue = 3,
}

impl Color {
    pub fn from_number(number: i64) -> Option<Self> {
        match number {
            1 => Some(Color::Red),
            2 => Some(Color::Green),
            3 => Some(Color::Blue),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
        };
        f.write_str(name)
    }
}

/// Converts a command argument into a [`Color`]
impl FromStr for Color {
    type Err = CommandError;

    fn from_str(arg: &str) -> Result<Self, Self::Err> {
        let number: i64 = arg
            .parse()
            .map_err(|_| CommandError::BadArgument(Some(format!("`{}` is not a valid number!", arg))))?;
        Color::from_number(number).ok_or_else(|| {
            CommandError::BadArgument(Some(format!("We don't have a color with number `{}`.", number)))
        })
    }
}

pub struct SampleCog;

impl SampleCog {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SampleCog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cog for SampleCog {
    fn name(&self) -> &str {
        "SampleCog"
    }

    fn description(&self) -> &str {
        "Sample commands"
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::new("sendcolor")
            .with_description("Pick a color by number")
            .with_usage("sendcolor <number>")]
    }

    async fn invoke(&self, command: &str, ctx: &Context) -> Result<Option<String>, CommandError> {
        match command {
            "sendcolor" => {
                let color: Color = ctx.arg(0, "color")?.parse()?;
                let reply = if color == Color::Red {
                    "You chose the best color, red!".to_string()
                } else {
                    format!("You chose {}!", color)
                };
                Ok(Some(reply))
            }
            other => Err(CommandError::NotFound(other.to_string())),
        }
    }
}
