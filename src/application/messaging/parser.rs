//! Message parser - Parses raw messages into structured messages

use crate::domain::entities::{Content, Message, User};

/// Parses incoming text; a command starts with the prefix or a mention of the bot
pub struct MessageParser {
    command_prefix: String,
    bot_id: Option<String>,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
            bot_id: None,
        }
    }

    /// Also accept `<@id>` / `<@!id>` mentions of the bot as a prefix
    pub fn when_mentioned(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = Some(bot_id.into());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Parse a text message
    pub fn parse(&self, chat_id: impl Into<String>, text: impl Into<String>, sender: Option<User>) -> Message {
        let text = text.into();
        let chat_id = chat_id.into();

        let Some(cmd_text) = self.strip_prefix(&text) else {
            let content = if text.trim().is_empty() {
                Content::Empty
            } else {
                Content::Text(text)
            };
            return Message::new(chat_id, content).with_sender_opt(sender);
        };

        let mut parts = cmd_text.split_whitespace();
        let content = match parts.next() {
            Some(name) => Content::Command {
                name: name.to_string(),
                args: parts.map(|s| s.to_string()).collect(),
            },
            None => Content::Empty,
        };

        Message::new(chat_id, content).with_sender_opt(sender)
    }

    fn strip_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        if let Some(id) = &self.bot_id {
            for mention in [format!("<@{}>", id), format!("<@!{}>", id)] {
                if let Some(rest) = text.strip_prefix(mention.as_str()) {
                    return Some(rest.trim_start());
                }
            }
        }
        if self.command_prefix.is_empty() {
            return None;
        }
        text.strip_prefix(self.command_prefix.as_str())
    }
}
