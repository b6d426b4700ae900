use super::{DirectMessageError, IMessagingClient};
use crate::config::ChatWebhookSettings;
use reqwest::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DirectMessageRequest<'a> {
    user_ref: &'a str,
    text: &'a str,
}

/// Delivers direct messages through an HTTP bridge in front of the chat
/// platform
pub struct WebhookMessagingClient {
    client: reqwest::Client,
    settings: ChatWebhookSettings,
}

impl WebhookMessagingClient {
    pub fn new(settings: ChatWebhookSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }
}

fn classify_status(status: StatusCode, user_ref: &str) -> Result<(), DirectMessageError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::FORBIDDEN | StatusCode::NOT_FOUND | StatusCode::GONE => Err(
            DirectMessageError::RecipientUnreachable(user_ref.to_string()),
        ),
        s => Err(DirectMessageError::Unexpected(format!(
            "Chat webhook responded with status: {}",
            s
        ))),
    }
}

#[async_trait::async_trait]
impl IMessagingClient for WebhookMessagingClient {
    async fn send_direct_message(
        &self,
        user_ref: &str,
        text: &str,
    ) -> Result<(), DirectMessageError> {
        let res = self
            .client
            .post(&self.settings.url)
            .header("game-notifier-webhook-key", &self.settings.key)
            .json(&DirectMessageRequest { user_ref, text })
            .send()
            .await
            .map_err(|e| DirectMessageError::Unexpected(e.to_string()))?;

        classify_status(res.status(), user_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_webhook_responses() {
        assert_eq!(classify_status(StatusCode::OK, "u"), Ok(()));
        assert_eq!(classify_status(StatusCode::NO_CONTENT, "u"), Ok(()));
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, "u"),
            Err(DirectMessageError::RecipientUnreachable("u".into()))
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, "u"),
            Err(DirectMessageError::RecipientUnreachable("u".into()))
        );
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "u"),
            Err(DirectMessageError::Unexpected(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "u"),
            Err(DirectMessageError::Unexpected(_))
        ));
    }
}
