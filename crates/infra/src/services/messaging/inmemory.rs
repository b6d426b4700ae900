use super::{DirectMessageError, IMessagingClient};
use std::{collections::HashSet, sync::Mutex};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct SentDirectMessage {
    pub user_ref: String,
    pub text: String,
}

/// Records direct messages instead of sending them. Used when no chat
/// platform is configured and in tests.
pub struct InMemoryMessagingClient {
    sent: Mutex<Vec<SentDirectMessage>>,
    unreachable: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
}

impl InMemoryMessagingClient {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            unreachable: Mutex::new(HashSet::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Sends to `user_ref` will fail with `RecipientUnreachable`
    pub fn set_unreachable(&self, user_ref: &str) {
        self.unreachable.lock().unwrap().insert(user_ref.to_string());
    }

    /// Sends to `user_ref` will fail with `Unexpected`
    pub fn set_failing(&self, user_ref: &str) {
        self.failing.lock().unwrap().insert(user_ref.to_string());
    }

    pub fn sent(&self) -> Vec<SentDirectMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, user_ref: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_ref == user_ref)
            .map(|m| m.text.clone())
            .collect()
    }
}

impl Default for InMemoryMessagingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IMessagingClient for InMemoryMessagingClient {
    async fn send_direct_message(
        &self,
        user_ref: &str,
        text: &str,
    ) -> Result<(), DirectMessageError> {
        if self.unreachable.lock().unwrap().contains(user_ref) {
            return Err(DirectMessageError::RecipientUnreachable(user_ref.to_string()));
        }
        if self.failing.lock().unwrap().contains(user_ref) {
            return Err(DirectMessageError::Unexpected("Connection reset".into()));
        }

        info!("Direct message to {}: {}", user_ref, text);
        self.sent.lock().unwrap().push(SentDirectMessage {
            user_ref: user_ref.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}
