use super::{deliver_all, messages, DeliveryReport, OutgoingMessage};
use crate::shared::usecase::UseCase;
use game_notifier_domain::{detect_promotions, Game, Participant, ID};
use game_notifier_infra::NotifyContext;
use tracing::info;

/// Tells the participants that moved off the waitlist after a roster or
/// capacity change that they are now confirmed.
///
/// `game` is the state after the change. The state before it is given by
/// `roster_before` and `capacity_before`.
#[derive(Debug)]
pub struct NotifyPromotionsUseCase {
    pub game: Game,
    pub roster_before: Vec<Participant>,
    pub capacity_before: Option<i64>,
    pub roster_after: Vec<Participant>,
}

#[derive(Debug, Default, PartialEq)]
pub struct PromotionReport {
    pub promoted: Vec<ID>,
    pub delivery: DeliveryReport,
}

#[derive(Debug)]
pub enum UseCaseError {}

#[async_trait::async_trait]
impl UseCase for NotifyPromotionsUseCase {
    type Response = PromotionReport;

    type Error = UseCaseError;

    const NAME: &'static str = "NotifyPromotions";

    async fn execute(&mut self, ctx: &NotifyContext) -> Result<Self::Response, Self::Error> {
        if self.game.has_started(ctx.sys.get_timestamp_millis()) {
            return Ok(PromotionReport::default());
        }

        let promoted = detect_promotions(
            &self.roster_before,
            self.capacity_before,
            &self.roster_after,
            self.game.max_participants,
        );
        if promoted.is_empty() {
            return Ok(PromotionReport::default());
        }
        info!(
            "{} participant(s) promoted from the waitlist of game: {}",
            promoted.len(),
            self.game.id
        );

        let text = messages::promotion(&self.game);
        let outgoing = promoted
            .iter()
            .filter_map(|p| {
                p.user_ref().map(|user_ref| OutgoingMessage {
                    participant_id: p.id,
                    user_ref: user_ref.to_string(),
                    text: text.clone(),
                })
            })
            .collect();

        Ok(PromotionReport {
            promoted: promoted.iter().map(|p| p.id).collect(),
            delivery: deliver_all(outgoing, ctx).await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_notifier_domain::ParticipantCategory;
    use game_notifier_infra::InMemoryMessagingClient;
    use std::sync::Arc;

    #[tokio::test]
    async fn notifies_participants_promoted_by_capacity_increase() {
        let mut ctx = NotifyContext::create_inmemory();
        let messaging = Arc::new(InMemoryMessagingClient::new());
        ctx.messaging = messaging.clone();

        let mut game = Game::new("Raid night", ctx.sys.get_timestamp_millis() + 1000 * 60 * 60);
        game.max_participants = Some(3);
        let roster = vec![
            Participant::user(game.id, "alice", ParticipantCategory::SelfAdded, 0, 1),
            Participant::user(game.id, "bob", ParticipantCategory::SelfAdded, 1, 2),
            Participant::placeholder(game.id, "Guest", ParticipantCategory::SelfAdded, 2, 3),
            Participant::user(game.id, "carol", ParticipantCategory::SelfAdded, 3, 4),
        ];

        let mut usecase = NotifyPromotionsUseCase {
            game,
            roster_before: roster.clone(),
            capacity_before: Some(1),
            roster_after: roster.clone(),
        };
        let report = usecase.execute(&ctx).await.unwrap();

        assert_eq!(report.promoted, vec![roster[1].id]);
        assert_eq!(report.delivery.sent, 1);
        assert_eq!(messaging.sent_to("bob").len(), 1);
        assert!(messaging.sent_to("carol").is_empty());
    }
}
