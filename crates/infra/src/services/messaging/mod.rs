mod inmemory;
mod webhook;

pub use inmemory::{InMemoryMessagingClient, SentDirectMessage};
use thiserror::Error;
pub use webhook::WebhookMessagingClient;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectMessageError {
    /// The user has direct messages disabled, left the platform or blocked
    /// the bot. Expected to happen now and then.
    #[error("Recipient: {0} can not be reached")]
    RecipientUnreachable(String),
    #[error("Unexpected error sending direct message. Error message: `{0}`")]
    Unexpected(String),
}

/// The chat platform as seen by the notification dispatcher
#[async_trait::async_trait]
pub trait IMessagingClient: Send + Sync {
    async fn send_direct_message(&self, user_ref: &str, text: &str)
        -> Result<(), DirectMessageError>;
}
