pub mod groq;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Settings;
use crate::errors::GatewayError;
use crate::logging::Logger;
use crate::models::chat::Message;
use self::groq::GroqChatClient;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the whole conversation upstream and returns the text of the first
    /// completion. Failures are logged and returned untouched.
    async fn generate_response(&self, messages: &[Message]) -> Result<String, GatewayError>;

    fn get_model(&self) -> String;
}

pub fn new_client(
    settings: &Settings,
    logger: Arc<Logger>
) -> Result<Arc<dyn ChatClient>, GatewayError> {
    let client = GroqChatClient::from_settings(settings, logger)?;
    Ok(Arc::new(client))
}
