use futures::{stream, StreamExt};
use game_notifier_domain::ID;
use game_notifier_infra::{DirectMessageError, NotifyContext};
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub participant_id: ID,
    pub user_ref: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryReport {
    pub sent: usize,
    /// Recipients that can not receive direct messages
    pub unreachable: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.unreachable + self.failed
    }
}

/// Sends every message with at most `dispatch_send_concurrency` in flight.
/// A failed send is logged and never stops the remaining ones.
pub async fn deliver_all(messages: Vec<OutgoingMessage>, ctx: &NotifyContext) -> DeliveryReport {
    let concurrency = ctx.config.dispatch_send_concurrency.max(1);

    let results = stream::iter(messages)
        .map(|message| async move {
            let res = ctx
                .messaging
                .send_direct_message(&message.user_ref, &message.text)
                .await;
            (message, res)
        })
        .buffer_unordered(concurrency)
        .collect::<Vec<_>>()
        .await;

    let mut report = DeliveryReport::default();
    for (message, res) in results {
        match res {
            Ok(()) => report.sent += 1,
            Err(DirectMessageError::RecipientUnreachable(user_ref)) => {
                warn!(
                    "Participant: {} with user: {} can not receive direct messages",
                    message.participant_id, user_ref
                );
                report.unreachable += 1;
            }
            Err(e) => {
                error!(
                    "Unable to send direct message to participant: {}. Err: {:?}",
                    message.participant_id, e
                );
                report.failed += 1;
            }
        }
    }
    report
}
