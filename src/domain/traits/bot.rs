use async_trait::async_trait;
use crate::application::errors::BotError;

/// Bot trait - abstraction over the chat platform connection
#[async_trait]
pub trait Bot: Send + Sync {
    /// Connect to the platform
    async fn start(&self) -> Result<(), BotError>;

    /// Send a message to a chat, returning the platform message id
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError>;

    /// Close the connection
    async fn close(&self) -> Result<(), BotError> {
        Ok(())
    }

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
