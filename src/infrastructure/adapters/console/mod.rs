//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use crate::domain::entities::User;
use crate::domain::traits::{Bot, BotInfo};
use crate::application::errors::BotError;

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    user: User,
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleAdapter {
    pub fn new(bot_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            info: BotInfo {
                id: "console-bot".to_string(),
                name: bot_name.into(),
                username: "console".to_string(),
            },
            user: User::new(user_id).with_username("console"),
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// The user every console line is attributed to
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Next input line, `None` at end of input
    pub async fn read_line(&self) -> Option<String> {
        match self.lines.lock().await.next_line().await {
            Ok(line) => line.map(|l| l.trim().to_string()),
            Err(e) => {
                tracing::error!("Failed to read console input: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn send_message(&self, _chat_id: &str, text: &str) -> Result<String, BotError> {
        println!("[BOT] {}", text);
        Ok(uuid::Uuid::new_v4().to_string())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
